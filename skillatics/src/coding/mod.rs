//! Coding practice: editor state, language templates, run and submit.

pub mod editor;
pub mod language;
pub mod models;
pub mod practice;

pub use editor::{CodeEditor, EditorError, EditorResult, ResultTab};
pub use language::{Language, LanguageConfig};
pub use models::{
    CaseResult, CodeSubmissionRecord, CodingQuestion, CodingQuestionSummary, CodingSubmission,
    DifficultyLabel, ExecuteRequest, ExecutionResponse, RunOutcome, SolveStatus, TestCase,
    TestReport,
};
pub use practice::{CodingBackend, CodingPractice};
