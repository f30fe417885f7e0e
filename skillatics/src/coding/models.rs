//! Coding question, execution and submission wire types.

use super::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Coarse difficulty bucket shown next to a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyLabel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLabel {
    /// 1 is easy, up to 3 is medium, above that is hard
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => DifficultyLabel::Easy,
            2 | 3 => DifficultyLabel::Medium,
            _ => DifficultyLabel::Hard,
        }
    }
}

impl fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLabel::Easy => write!(f, "Easy"),
            DifficultyLabel::Medium => write!(f, "Medium"),
            DifficultyLabel::Hard => write!(f, "Hard"),
        }
    }
}

fn default_level() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    /// Problem title
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_level")]
    pub difficulty: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Language id → template
    #[serde(default)]
    pub starter_code: BTreeMap<String, String>,
}

impl CodingQuestion {
    /// Question-specific starter for `language`, if one is set
    pub fn starter_for(&self, language: Language) -> Option<&str> {
        self.starter_code
            .get(language.id())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn visible_cases(&self) -> Vec<TestCase> {
        self.test_cases.iter().filter(|c| !c.hidden).cloned().collect()
    }

    pub fn label(&self) -> DifficultyLabel {
        DifficultyLabel::from_level(self.difficulty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Solved,
    Todo,
}

/// Row of `GET /code/questions`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodingQuestionSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_level")]
    pub difficulty: u8,
    #[serde(default = "default_status")]
    pub status: SolveStatus,
    #[serde(default)]
    pub acceptance: Option<String>,
}

fn default_status() -> SolveStatus {
    SolveStatus::Todo
}

/// `POST /code/execute` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteRequest {
    pub source_code: String,
    pub language: Language,
    pub test_cases: Vec<TestCase>,
}

/// `POST /code/submit-coding-test` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodingSubmission {
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub source_code: String,
    pub language: Language,
}

/// Per-case verdict; hidden cases carry only `test_case`, `passed` and `hidden`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    #[serde(default)]
    pub test_case: u32,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured pass/fail report for a run or a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub test_results: Vec<CaseResult>,
    #[serde(default)]
    pub passed_tests: u32,
    #[serde(default)]
    pub total_tests: u32,
}

impl TestReport {
    pub fn all_passed(&self) -> bool {
        self.total_tests > 0 && self.passed_tests == self.total_tests
    }
}

/// Raw `POST /code/execute` response: either free text or a report
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub test_results: Option<Vec<CaseResult>>,
    #[serde(default)]
    pub passed_tests: Option<u32>,
    #[serde(default)]
    pub total_tests: Option<u32>,
}

/// What a run produced, decided by the presence of `test_results`
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Report(TestReport),
    Output(String),
}

impl From<ExecutionResponse> for RunOutcome {
    fn from(response: ExecutionResponse) -> Self {
        match response.test_results {
            Some(results) => {
                let passed = results.iter().filter(|r| r.passed).count() as u32;
                let total = results.len() as u32;
                RunOutcome::Report(TestReport {
                    success: response.success,
                    passed_tests: response.passed_tests.unwrap_or(passed),
                    total_tests: response.total_tests.unwrap_or(total),
                    test_results: results,
                })
            }
            None => {
                let text = [response.output, response.stdout, response.error]
                    .into_iter()
                    .flatten()
                    .find(|s| !s.is_empty())
                    .unwrap_or_else(|| "No output".to_string());
                RunOutcome::Output(text)
            }
        }
    }
}

/// Row of `GET /code/my-submissions`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CodeSubmissionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "questionId", default)]
    pub question_id: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub test_results: Vec<CaseResult>,
    #[serde(default)]
    pub all_passed: bool,
    #[serde(default)]
    pub passed_count: u32,
    #[serde(default)]
    pub total_count: u32,
    #[serde(rename = "submittedAt", default)]
    pub submitted_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_detected_by_test_results() {
        let response: ExecutionResponse = serde_json::from_str(
            r#"{"success":true,"total_tests":1,"passed_tests":1,
                "test_results":[{"test_case":1,"input":"1 2","expected_output":"3",
                                 "actual_output":"3","passed":true,"status":"Accepted"}]}"#,
        )
        .unwrap();

        match RunOutcome::from(response) {
            RunOutcome::Report(report) => {
                assert!(report.all_passed());
                assert_eq!(report.test_results[0].actual_output.as_deref(), Some("3"));
            }
            other => panic!("expected report, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_output_fallback_order() {
        let from = |json: &str| RunOutcome::from(serde_json::from_str::<ExecutionResponse>(json).unwrap());

        assert_eq!(
            from(r#"{"output":"hi","stdout":"ignored"}"#),
            RunOutcome::Output("hi".to_string())
        );
        assert_eq!(
            from(r#"{"output":"","stdout":"out"}"#),
            RunOutcome::Output("out".to_string())
        );
        assert_eq!(
            from(r#"{"output":"","stdout":"","error":"SyntaxError"}"#),
            RunOutcome::Output("SyntaxError".to_string())
        );
        assert_eq!(
            from(r#"{"success":true,"error":null}"#),
            RunOutcome::Output("No output".to_string())
        );
    }

    #[test]
    fn test_hidden_case_result_decodes() {
        let report: TestReport = serde_json::from_str(
            r#"{"success":false,"passed_tests":1,"total_tests":2,
                "test_results":[{"test_case":1,"passed":true,"hidden":false},
                                {"test_case":2,"passed":false,"hidden":true}]}"#,
        )
        .unwrap();
        assert!(!report.all_passed());
        assert!(report.test_results[1].hidden);
        assert_eq!(report.test_results[1].input, None);
    }

    #[test]
    fn test_starter_lookup_ignores_empty() {
        let question: CodingQuestion = serde_json::from_str(
            r#"{"_id":"c1","text":"Two Sum","difficulty":2,
                "starter_code":{"python":"def two_sum(): pass","java":""},
                "test_cases":[{"input":"1","expected_output":"1"},
                              {"input":"2","expected_output":"2","hidden":true}]}"#,
        )
        .unwrap();

        assert_eq!(question.starter_for(Language::Python), Some("def two_sum(): pass"));
        assert_eq!(question.starter_for(Language::Java), None);
        assert_eq!(question.visible_cases().len(), 1);
        assert_eq!(question.label(), DifficultyLabel::Medium);
    }

    #[test]
    fn test_submission_body_shape() {
        let body = serde_json::to_value(CodingSubmission {
            question_id: "c1".to_string(),
            source_code: "print(1)".to_string(),
            language: Language::Cpp,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"questionId":"c1","source_code":"print(1)","language":"cpp"})
        );
    }
}
