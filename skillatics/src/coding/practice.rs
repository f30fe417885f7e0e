//! Run and submit against the execution backend.

use super::editor::{CodeEditor, EditorError, EditorResult};
use super::language::Language;
use super::models::{CodingQuestion, CodingSubmission, ExecuteRequest, RunOutcome, TestReport};
use crate::api::ApiResult;
use crate::single_flight::SingleFlight;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[async_trait]
pub trait CodingBackend: Send + Sync {
    async fn execute_code(&self, request: &ExecuteRequest) -> ApiResult<RunOutcome>;

    async fn submit_code(&self, submission: &CodingSubmission) -> ApiResult<TestReport>;
}

#[async_trait]
impl<T: CodingBackend + ?Sized> CodingBackend for Arc<T> {
    async fn execute_code(&self, request: &ExecuteRequest) -> ApiResult<RunOutcome> {
        (**self).execute_code(request).await
    }

    async fn submit_code(&self, submission: &CodingSubmission) -> ApiResult<TestReport> {
        (**self).submit_code(submission).await
    }
}

/// A [`CodeEditor`] wired to a backend.
///
/// One run or submit at a time. Switching language or loading a new
/// question orphans a pending call; its result is dropped with
/// [`EditorError::Stale`].
pub struct CodingPractice<B> {
    backend: B,
    editor: Mutex<CodeEditor>,
    flight: SingleFlight,
}

impl<B: CodingBackend> CodingPractice<B> {
    pub fn new(backend: B, question: Option<CodingQuestion>, language: Language) -> Self {
        Self {
            backend,
            editor: Mutex::new(CodeEditor::new(question, language)),
            flight: SingleFlight::new(),
        }
    }

    fn editor(&self) -> MutexGuard<'_, CodeEditor> {
        self.editor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CodeEditor {
        self.editor().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Edit the buffer in place
    pub fn edit<R>(&self, f: impl FnOnce(&mut CodeEditor) -> R) -> R {
        f(&mut self.editor())
    }

    pub fn switch_language(&self, language: Language) {
        let mut editor = self.editor();
        self.flight.invalidate();
        editor.switch_language(language);
        log::debug!("Editor switched to {language}");
    }

    pub fn load_question(&self, question: CodingQuestion) {
        let mut editor = self.editor();
        self.flight.invalidate();
        log::debug!("Editor loaded question {}", question.id);
        editor.load_question(question);
    }

    pub fn reset(&self) {
        self.editor().reset();
    }

    /// Run the buffer against the question's visible cases
    pub async fn run(&self) -> EditorResult<RunOutcome> {
        let flight = self.flight.try_begin().ok_or(EditorError::Busy)?;
        let request = self.editor().begin_run()?;
        log::debug!(
            "Running {} bytes of {} against {} cases",
            request.source_code.len(),
            request.language,
            request.test_cases.len()
        );

        let result = self.backend.execute_code(&request).await;

        let mut editor = self.editor();
        if !flight.is_current() {
            log::debug!("Dropping run result after editor change");
            return Err(EditorError::Stale);
        }
        editor.finish_run(result)
    }

    /// Grade the buffer against every case, hidden ones included
    pub async fn submit(&self) -> EditorResult<TestReport> {
        let flight = self.flight.try_begin().ok_or(EditorError::Busy)?;
        let submission = self.editor().begin_submit()?;
        log::info!(
            "Submitting {} solution for {}",
            submission.language,
            submission.question_id
        );

        let result = self.backend.submit_code(&submission).await;

        let mut editor = self.editor();
        if !flight.is_current() {
            log::debug!("Dropping submission result after editor change");
            return Err(EditorError::Stale);
        }
        let report = editor.finish_submit(result)?;
        log::info!(
            "Submission graded: {}/{} passed",
            report.passed_tests,
            report.total_tests
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::coding::editor::ResultTab;
    use tokio::sync::Notify;

    struct Echo {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl CodingBackend for Echo {
        async fn execute_code(&self, request: &ExecuteRequest) -> ApiResult<RunOutcome> {
            self.gate.notified().await;
            Ok(RunOutcome::Output(request.source_code.clone()))
        }

        async fn submit_code(&self, _submission: &CodingSubmission) -> ApiResult<TestReport> {
            Err(ApiError::Network("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_language_switch_discards_pending_run() {
        let gate = Arc::new(Notify::new());
        let practice = Arc::new(CodingPractice::new(
            Echo { gate: gate.clone() },
            None,
            Language::Python,
        ));

        let pending = tokio::spawn({
            let practice = practice.clone();
            async move { practice.run().await }
        });
        while !practice.is_busy() {
            tokio::task::yield_now().await;
        }

        practice.switch_language(Language::Java);
        gate.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(EditorError::Stale)));
        let editor = practice.snapshot();
        assert_eq!(editor.buffer(), Language::Java.template());
        assert_eq!(editor.output(), "");
        assert!(!editor.is_executing());
    }

    #[tokio::test]
    async fn test_run_output_lands_in_pane() {
        let gate = Arc::new(Notify::new());
        gate.notify_one();
        let practice = CodingPractice::new(Echo { gate }, None, Language::Python);
        practice.edit(|e| e.set_buffer("print(42)"));

        let outcome = practice.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::Output("print(42)".to_string()));
        assert_eq!(practice.snapshot().output(), "print(42)");
    }

    #[tokio::test]
    async fn test_submit_error_keeps_draft() {
        let question = CodingQuestion {
            id: "c9".to_string(),
            text: "Echo".to_string(),
            description: String::new(),
            difficulty: 1,
            topic: None,
            test_cases: Vec::new(),
            starter_code: Default::default(),
        };
        let practice = CodingPractice::new(
            Echo {
                gate: Arc::new(Notify::new()),
            },
            Some(question),
            Language::Python,
        );
        practice.edit(|e| e.set_buffer("my draft"));

        assert!(practice.submit().await.is_err());
        let editor = practice.snapshot();
        assert_eq!(editor.buffer(), "my draft");
        assert_eq!(editor.output(), "Error: Could not reach the server");
        assert_eq!(editor.tab(), ResultTab::Output);
        assert!(!practice.is_busy());
    }
}
