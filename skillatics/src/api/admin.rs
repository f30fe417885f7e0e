//! Admin endpoints: users, the question bank and topics.

use super::client::{ApiClient, segment};
use super::errors::{ApiError, ApiResult};
use super::models::{
    CreatedId, CsvImportReport, GenerateQuestions, GenerateReport, NewQuestion, Topic, TopicDraft,
    UserRecord,
};
use crate::auth::Role;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::json;

impl ApiClient {
    pub async fn list_users(&self) -> ApiResult<Vec<UserRecord>> {
        self.get("/admin/users").await
    }

    /// Change a user's role; TPO cannot be assigned from the admin panel
    pub async fn update_user_role(&self, user_id: &str, role: Role) -> ApiResult<()> {
        if role == Role::Tpo {
            return Err(ApiError::Validation(
                "Role must be Student, TPO/Faculty or Admin".to_string(),
            ));
        }
        let path = format!("/admin/users/{}/role", segment(user_id)?);
        let body = json!({ "role": role.wire_name() });
        self.ack(Method::PUT, &path, Some(&body)).await?;
        log::info!("Role of {user_id} set to {role}");
        Ok(())
    }

    pub async fn update_user_department(&self, user_id: &str, department: &str) -> ApiResult<()> {
        if department.trim().is_empty() {
            return Err(ApiError::Validation("Department is required".to_string()));
        }
        let path = format!("/admin/users/{}/department", segment(user_id)?);
        let body = json!({ "department": department.trim() });
        self.ack(Method::PUT, &path, Some(&body)).await
    }

    /// Create one MCQ and return its id
    pub async fn create_question(&self, question: &NewQuestion) -> ApiResult<String> {
        question.validate().map_err(ApiError::Validation)?;
        let created: CreatedId = self.post("/admin/questions", question).await?;
        log::info!("Created question {} under '{}'", created.id, question.topic);
        Ok(created.id)
    }

    /// Upload a CSV of MCQs as the multipart field `file`
    pub async fn import_questions_csv(&self, file_name: &str, contents: Vec<u8>) -> ApiResult<CsvImportReport> {
        if contents.is_empty() {
            return Err(ApiError::Validation("CSV file is empty".to_string()));
        }

        let report: CsvImportReport = self
            .call(Method::POST, "/admin/questions/csv", |b| {
                let part = Part::bytes(contents.clone()).file_name(file_name.to_string());
                b.multipart(Form::new().part("file", part))
            })
            .await?;

        log::info!(
            "CSV import: {} inserted, {} rejected",
            report.inserted,
            report.errors.len()
        );
        Ok(report)
    }

    pub async fn generate_questions(&self, request: &GenerateQuestions) -> ApiResult<GenerateReport> {
        request.validate().map_err(ApiError::Validation)?;
        self.post("/admin/generate-questions", request).await
    }

    pub async fn admin_topics(&self) -> ApiResult<Vec<Topic>> {
        self.get("/admin/topics").await
    }

    pub async fn create_topic(&self, draft: &TopicDraft) -> ApiResult<()> {
        draft.validate().map_err(ApiError::Validation)?;
        let body = serde_json::to_value(draft).map_err(|e| ApiError::Validation(e.to_string()))?;
        self.ack(Method::POST, "/admin/topics", Some(&body)).await
    }

    pub async fn update_topic(&self, topic_id: &str, draft: &TopicDraft) -> ApiResult<()> {
        draft.validate().map_err(ApiError::Validation)?;
        let path = format!("/admin/topics/{}", segment(topic_id)?);
        let body = serde_json::to_value(draft).map_err(|e| ApiError::Validation(e.to_string()))?;
        self.ack(Method::PUT, &path, Some(&body)).await
    }

    pub async fn delete_topic(&self, topic_id: &str) -> ApiResult<()> {
        let path = format!("/admin/topics/{}", segment(topic_id)?);
        self.ack(Method::DELETE, &path, None).await?;
        log::info!("Deleted topic {topic_id}");
        Ok(())
    }
}
