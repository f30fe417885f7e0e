//! Student-facing endpoints: learning content, adaptive tests and coding.

use super::client::{ApiClient, segment};
use super::errors::{ApiError, ApiResult};
use super::models::{PracticeQuestion, Topic, TopicCatalog};
use crate::coding::{
    CodeSubmissionRecord, CodingBackend, CodingQuestion, CodingQuestionSummary, CodingSubmission,
    ExecuteRequest, ExecutionResponse, RunOutcome, TestReport,
};
use crate::test_session::{
    SectionFilter, StartTestRequest, StartTestResponse, SubmitAnswerRequest, SubmitAnswerResponse,
    TestBackend,
};
use async_trait::async_trait;
use reqwest::Method;

impl ApiClient {
    pub async fn topics(&self) -> ApiResult<TopicCatalog> {
        self.get("/learn/topics").await
    }

    pub async fn topic(&self, topic_id: &str) -> ApiResult<Topic> {
        self.get(&format!("/learn/topics/{}", segment(topic_id)?)).await
    }

    pub async fn topic_questions(&self, topic_id: &str) -> ApiResult<Vec<PracticeQuestion>> {
        self.get(&format!("/learn/topics/{}/questions", segment(topic_id)?))
            .await
    }

    /// Begin an adaptive test
    ///
    /// # Errors
    ///
    /// * `ApiError::Status` - 404 when the pool has no questions for the section
    pub async fn start_test(&self, section: SectionFilter) -> ApiResult<StartTestResponse> {
        let response: StartTestResponse = self
            .post("/test/start", &StartTestRequest::from(section))
            .await?;
        log::info!("Test session {} started ({section})", response.session_id);
        Ok(response)
    }

    pub async fn submit_answer(&self, request: &SubmitAnswerRequest) -> ApiResult<SubmitAnswerResponse> {
        if request.selected_option.is_empty() {
            return Err(ApiError::Validation("Select an option first".to_string()));
        }
        self.post("/test/submit", request).await
    }

    /// Run code against the supplied cases, or with no cases for raw output
    pub async fn execute_code(&self, request: &ExecuteRequest) -> ApiResult<RunOutcome> {
        if request.source_code.trim().is_empty() {
            return Err(ApiError::Validation("Source code is required".to_string()));
        }
        let response: ExecutionResponse = self.post("/code/execute", request).await?;
        Ok(response.into())
    }

    /// Grade code against every case of the question, hidden ones included
    pub async fn submit_coding(&self, submission: &CodingSubmission) -> ApiResult<TestReport> {
        if submission.source_code.trim().is_empty() {
            return Err(ApiError::Validation("Source code is required".to_string()));
        }
        segment(&submission.question_id)?;
        self.post("/code/submit-coding-test", submission).await
    }

    /// Coding catalog, optionally narrowed to one difficulty level
    pub async fn coding_questions(&self, difficulty: Option<u8>) -> ApiResult<Vec<CodingQuestionSummary>> {
        self.call(Method::GET, "/code/questions", |b| match difficulty {
            Some(level) => b.query(&[("difficulty", level)]),
            None => b,
        })
        .await
    }

    pub async fn coding_question(&self, question_id: &str) -> ApiResult<CodingQuestion> {
        self.get(&format!("/code/question/{}", segment(question_id)?))
            .await
    }

    pub async fn random_coding_question(&self) -> ApiResult<CodingQuestion> {
        self.get("/code/question/random").await
    }

    pub async fn my_submissions(&self) -> ApiResult<Vec<CodeSubmissionRecord>> {
        self.get("/code/my-submissions").await
    }
}

#[async_trait]
impl TestBackend for ApiClient {
    async fn start_test(&self, section: SectionFilter) -> ApiResult<StartTestResponse> {
        ApiClient::start_test(self, section).await
    }

    async fn submit_answer(&self, request: &SubmitAnswerRequest) -> ApiResult<SubmitAnswerResponse> {
        ApiClient::submit_answer(self, request).await
    }
}

#[async_trait]
impl CodingBackend for ApiClient {
    async fn execute_code(&self, request: &ExecuteRequest) -> ApiResult<RunOutcome> {
        ApiClient::execute_code(self, request).await
    }

    async fn submit_code(&self, submission: &CodingSubmission) -> ApiResult<TestReport> {
        self.submit_coding(submission).await
    }
}
