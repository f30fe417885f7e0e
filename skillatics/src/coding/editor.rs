//! Editor buffer and result pane state.
//!
//! The buffer is only ever replaced by an explicit user action: a language
//! switch, a reset, a new question, or an edit. Run and submit outcomes,
//! including failures, touch the result pane and nothing else.

use super::language::Language;
use super::models::{CodingQuestion, CodingSubmission, ExecuteRequest, RunOutcome, TestReport};
use crate::api::{ApiError, ApiResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No code to execute")]
    EmptySource,
    #[error("No question loaded")]
    NoQuestion,
    #[error("Already running")]
    Busy,
    #[error("Result discarded after the editor changed")]
    Stale,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl EditorError {
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

/// Which result pane is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultTab {
    #[default]
    Output,
    TestCases,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeEditor {
    question: Option<CodingQuestion>,
    language: Language,
    buffer: String,
    output: String,
    report: Option<TestReport>,
    tab: ResultTab,
    executing: bool,
}

impl Default for CodeEditor {
    fn default() -> Self {
        Self::new(None, Language::default())
    }
}

impl CodeEditor {
    pub fn new(question: Option<CodingQuestion>, language: Language) -> Self {
        let mut editor = Self {
            question,
            language,
            buffer: String::new(),
            output: String::new(),
            report: None,
            tab: ResultTab::Output,
            executing: false,
        };
        editor.buffer = editor.starter_code();
        editor
    }

    /// Question starter for the current language, else the generic template
    pub fn starter_code(&self) -> String {
        self.question
            .as_ref()
            .and_then(|q| q.starter_for(self.language))
            .unwrap_or_else(|| self.language.template())
            .to_string()
    }

    pub fn question(&self) -> Option<&CodingQuestion> {
        self.question.as_ref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn report(&self) -> Option<&TestReport> {
        self.report.as_ref()
    }

    pub fn tab(&self) -> ResultTab {
        self.tab
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn set_tab(&mut self, tab: ResultTab) {
        self.tab = tab;
    }

    pub fn set_buffer(&mut self, code: impl Into<String>) {
        self.buffer = code.into();
    }

    pub fn push_line(&mut self, line: &str) {
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    fn clear_results(&mut self) {
        self.output.clear();
        self.report = None;
        self.executing = false;
    }

    /// Load a different question; the buffer becomes its starter
    pub fn load_question(&mut self, question: CodingQuestion) {
        self.question = Some(question);
        self.buffer = self.starter_code();
        self.clear_results();
        self.tab = ResultTab::Output;
    }

    /// Switch language, discarding the current buffer and results
    pub fn switch_language(&mut self, language: Language) {
        self.language = language;
        self.buffer = self.starter_code();
        self.clear_results();
    }

    /// Restore the starter for the current language
    pub fn reset(&mut self) {
        self.buffer = self.starter_code();
    }

    /// Prepare a run of the buffer against the visible cases.
    ///
    /// # Errors
    ///
    /// * `EditorError::EmptySource` - Buffer is blank; the output pane says so
    /// * `EditorError::Busy` - A run or submit is pending
    pub fn begin_run(&mut self) -> EditorResult<ExecuteRequest> {
        if self.executing {
            return Err(EditorError::Busy);
        }
        if self.buffer.trim().is_empty() {
            self.output = format!("Error: {}", EditorError::EmptySource);
            self.tab = ResultTab::Output;
            return Err(EditorError::EmptySource);
        }

        self.executing = true;
        self.output = "Running...".to_string();
        self.report = None;
        self.tab = ResultTab::Output;

        Ok(ExecuteRequest {
            source_code: self.buffer.clone(),
            language: self.language,
            test_cases: self
                .question
                .as_ref()
                .map(CodingQuestion::visible_cases)
                .unwrap_or_default(),
        })
    }

    /// Apply a run result; a report flips the pane to the test cases
    pub fn finish_run(&mut self, result: ApiResult<RunOutcome>) -> EditorResult<RunOutcome> {
        self.executing = false;
        match result {
            Ok(RunOutcome::Report(report)) => {
                self.report = Some(report.clone());
                self.tab = ResultTab::TestCases;
                Ok(RunOutcome::Report(report))
            }
            Ok(RunOutcome::Output(text)) => {
                self.output = text.clone();
                Ok(RunOutcome::Output(text))
            }
            Err(e) => {
                self.output = format!("Error: {}", e.user_message());
                Err(e.into())
            }
        }
    }

    /// Prepare a graded submission.
    ///
    /// # Errors
    ///
    /// * `EditorError::NoQuestion` - Nothing to grade against
    /// * `EditorError::EmptySource` - Buffer is blank
    /// * `EditorError::Busy` - A run or submit is pending
    pub fn begin_submit(&mut self) -> EditorResult<CodingSubmission> {
        if self.executing {
            return Err(EditorError::Busy);
        }
        let question_id = self
            .question
            .as_ref()
            .map(|q| q.id.clone())
            .ok_or(EditorError::NoQuestion)?;
        if self.buffer.trim().is_empty() {
            return Err(EditorError::EmptySource);
        }

        self.executing = true;
        Ok(CodingSubmission {
            question_id,
            source_code: self.buffer.clone(),
            language: self.language,
        })
    }

    pub fn finish_submit(&mut self, result: ApiResult<TestReport>) -> EditorResult<TestReport> {
        self.executing = false;
        match result {
            Ok(report) => {
                self.report = Some(report.clone());
                self.tab = ResultTab::TestCases;
                Ok(report)
            }
            Err(e) => {
                self.output = format!("Error: {}", e.user_message());
                self.tab = ResultTab::Output;
                Err(e.into())
            }
        }
    }
}
