//! Wire types for the adaptive test endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which question pool a test draws from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SectionFilter {
    General,
    Technical,
    #[default]
    Mixed,
}

impl SectionFilter {
    pub const ALL: [SectionFilter; 3] = [
        SectionFilter::General,
        SectionFilter::Technical,
        SectionFilter::Mixed,
    ];

    /// Category name sent as `type`; `None` means no filter
    pub const fn wire_type(self) -> Option<&'static str> {
        match self {
            SectionFilter::General => Some("General Aptitude"),
            SectionFilter::Technical => Some("Technical Aptitude"),
            SectionFilter::Mixed => None,
        }
    }
}

impl fmt::Display for SectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_type().unwrap_or("Mixed"))
    }
}

impl FromStr for SectionFilter {
    type Err = String;

    /// Accepts the category names, the legacy `Aptitude`/`Technical`
    /// names, and an empty string for a mixed test
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "general aptitude" | "aptitude" => Ok(SectionFilter::General),
            "technical" | "technical aptitude" => Ok(SectionFilter::Technical),
            "" | "mixed" | "all" => Ok(SectionFilter::Mixed),
            other => Err(format!(
                "unknown section '{other}' (expected general, technical or mixed)"
            )),
        }
    }
}

/// `POST /test/start` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartTestRequest {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl From<SectionFilter> for StartTestRequest {
    fn from(filter: SectionFilter) -> Self {
        Self {
            section: filter.wire_type().map(str::to_string),
        }
    }
}

/// A multiple-choice question as delivered during a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TestQuestion {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTestResponse {
    pub session_id: String,
    pub question: TestQuestion,
}

/// `POST /test/submit` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub session_id: String,
    pub question_id: String,
    pub selected_option: String,
}

/// Final, backend-authoritative result of a test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub score: f64,
    pub correct_questions: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitAnswerResponse {
    Continue {
        question: TestQuestion,
        #[serde(default, rename = "nextDifficulty")]
        next_difficulty: Option<u8>,
    },
    Complete(TestOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_legacy_names() {
        assert_eq!("Aptitude".parse::<SectionFilter>(), Ok(SectionFilter::General));
        assert_eq!("Technical".parse::<SectionFilter>(), Ok(SectionFilter::Technical));
        assert_eq!(
            "General Aptitude".parse::<SectionFilter>(),
            Ok(SectionFilter::General)
        );
        assert_eq!("".parse::<SectionFilter>(), Ok(SectionFilter::Mixed));
        assert!("Verbal".parse::<SectionFilter>().is_err());
    }

    #[test]
    fn test_start_request_omits_type_for_mixed() {
        let body = serde_json::to_value(StartTestRequest::from(SectionFilter::Mixed)).unwrap();
        assert_eq!(body, serde_json::json!({}));

        let body = serde_json::to_value(StartTestRequest::from(SectionFilter::General)).unwrap();
        assert_eq!(body, serde_json::json!({"type": "General Aptitude"}));
    }

    #[test]
    fn test_submit_request_is_camel_case() {
        let body = serde_json::to_value(SubmitAnswerRequest {
            session_id: "s1".to_string(),
            question_id: "q1".to_string(),
            selected_option: "b".to_string(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"sessionId": "s1", "questionId": "q1", "selectedOption": "b"})
        );
    }

    #[test]
    fn test_decode_continue() {
        let resp: SubmitAnswerResponse = serde_json::from_str(
            r#"{"status":"continue","nextDifficulty":3,
                "question":{"_id":"q2","text":"2+2?","options":["3","4"],"answer":"4","difficulty":3}}"#,
        )
        .unwrap();
        match resp {
            SubmitAnswerResponse::Continue {
                question,
                next_difficulty,
            } => {
                assert_eq!(question.id, "q2");
                assert_eq!(next_difficulty, Some(3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_complete() {
        let resp: SubmitAnswerResponse = serde_json::from_str(
            r#"{"status":"complete","score":66.67,"totalQuestions":3,"correctQuestions":2}"#,
        )
        .unwrap();
        assert_eq!(
            resp,
            SubmitAnswerResponse::Complete(TestOutcome {
                score: 66.67,
                correct_questions: 2,
                total_questions: 3,
            })
        );
    }
}
