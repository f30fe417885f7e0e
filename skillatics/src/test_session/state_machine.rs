//! Pure adaptive-test state machine.
//!
//! No I/O happens here. [`super::TestSessionFlow`] performs the backend
//! calls and feeds their results into these transitions.

use super::models::{
    SectionFilter, StartTestResponse, SubmitAnswerRequest, SubmitAnswerResponse, TestOutcome,
    TestQuestion,
};
use crate::api::ApiError;
use std::fmt;
use thiserror::Error;

/// Errors raised by test-session transitions and the flow driving them
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a request is already in flight")]
    RequestInFlight,
    #[error("can't {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("'{0}' is not one of the options")]
    InvalidOption(String),
    #[error("option {0} does not exist")]
    InvalidOptionIndex(usize),
    #[error("select an answer first")]
    NoSelection,
    #[error("response arrived after the test was reset")]
    Stale,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Text shown inline next to the control that failed
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// The question currently on screen and what the student picked
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTest {
    pub session_id: String,
    pub question: TestQuestion,
    pub selected: Option<String>,
    /// Answers accepted by the backend so far
    pub answered: u32,
    /// Difficulty the backend moved to after the last answer
    pub difficulty: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TestPhase {
    #[default]
    Idle,
    Loading,
    Active(ActiveTest),
    Complete(TestOutcome),
    Error(String),
}

impl TestPhase {
    pub const fn name(&self) -> &'static str {
        match self {
            TestPhase::Idle => "idle",
            TestPhase::Loading => "loading",
            TestPhase::Active(_) => "active",
            TestPhase::Complete(_) => "complete",
            TestPhase::Error(_) => "in error",
        }
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestState {
    phase: TestPhase,
    section: SectionFilter,
    /// Inline error from the last failed submit; the question stays up
    last_error: Option<String>,
}

impl TestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &TestPhase {
        &self.phase
    }

    pub fn section(&self) -> SectionFilter {
        self.section
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn active(&self) -> Option<&ActiveTest> {
        match &self.phase {
            TestPhase::Active(active) => Some(active),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    fn active_mut(&mut self, action: &'static str) -> SessionResult<&mut ActiveTest> {
        let phase = self.phase.name();
        match &mut self.phase {
            TestPhase::Active(active) => Ok(active),
            _ => Err(SessionError::InvalidTransition { action, phase }),
        }
    }

    /// Idle or Error → Loading
    pub fn begin_start(&mut self, section: SectionFilter) -> SessionResult<()> {
        match self.phase {
            TestPhase::Idle | TestPhase::Error(_) => {
                self.phase = TestPhase::Loading;
                self.section = section;
                self.last_error = None;
                Ok(())
            }
            _ => Err(self.invalid("start a test")),
        }
    }

    /// Loading → Active with the first question
    pub fn started(&mut self, response: StartTestResponse) -> SessionResult<()> {
        if self.phase != TestPhase::Loading {
            return Err(self.invalid("accept a new session"));
        }
        let difficulty = response.question.difficulty;
        self.phase = TestPhase::Active(ActiveTest {
            session_id: response.session_id,
            question: response.question,
            selected: None,
            answered: 0,
            difficulty,
        });
        Ok(())
    }

    /// Loading → Error
    pub fn start_failed(&mut self, message: impl Into<String>) -> SessionResult<()> {
        if self.phase != TestPhase::Loading {
            return Err(self.invalid("fail a start"));
        }
        self.phase = TestPhase::Error(message.into());
        Ok(())
    }

    /// Pick an option of the current question
    pub fn select(&mut self, option: &str) -> SessionResult<()> {
        let active = self.active_mut("select an answer")?;
        if !active.question.has_option(option) {
            return Err(SessionError::InvalidOption(option.to_string()));
        }
        active.selected = Some(option.to_string());
        self.last_error = None;
        Ok(())
    }

    /// Pick an option by its zero-based position
    pub fn select_index(&mut self, index: usize) -> SessionResult<()> {
        let option = self
            .active()
            .ok_or_else(|| self.invalid("select an answer"))?
            .question
            .options
            .get(index)
            .cloned()
            .ok_or(SessionError::InvalidOptionIndex(index))?;
        self.select(&option)
    }

    /// Body for the submit call; requires a selection
    pub fn submission(&self) -> SessionResult<SubmitAnswerRequest> {
        let active = self.active().ok_or_else(|| self.invalid("submit"))?;
        let selected = active.selected.clone().ok_or(SessionError::NoSelection)?;
        Ok(SubmitAnswerRequest {
            session_id: active.session_id.clone(),
            question_id: active.question.id.clone(),
            selected_option: selected,
        })
    }

    /// Apply the backend's answer: next question or the final outcome
    pub fn submitted(&mut self, response: SubmitAnswerResponse) -> SessionResult<()> {
        let active = self.active_mut("accept an answer")?;
        match response {
            SubmitAnswerResponse::Continue {
                question,
                next_difficulty,
            } => {
                active.question = question;
                active.selected = None;
                active.answered += 1;
                active.difficulty = next_difficulty.or(active.question.difficulty);
            }
            SubmitAnswerResponse::Complete(outcome) => {
                self.phase = TestPhase::Complete(outcome);
            }
        }
        self.last_error = None;
        Ok(())
    }

    /// Keep the question and selection, remember the message
    pub fn submit_failed(&mut self, message: impl Into<String>) -> SessionResult<()> {
        self.active_mut("fail a submit")?;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// Back to Idle from any phase ("Take Another Test")
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str) -> TestQuestion {
        TestQuestion {
            id: id.to_string(),
            text: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            topic: Some("Percentages".to_string()),
            difficulty: Some(2),
            category: Some("General Aptitude".to_string()),
        }
    }

    fn active_state() -> TestState {
        let mut state = TestState::new();
        state.begin_start(SectionFilter::General).unwrap();
        state
            .started(StartTestResponse {
                session_id: "s1".to_string(),
                question: question("q1"),
            })
            .unwrap();
        state
    }

    #[test]
    fn test_start_moves_to_active() {
        let state = active_state();
        let active = state.active().unwrap();
        assert_eq!(active.session_id, "s1");
        assert_eq!(active.question.id, "q1");
        assert_eq!(active.selected, None);
        assert_eq!(state.section(), SectionFilter::General);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut state = active_state();
        assert!(matches!(
            state.begin_start(SectionFilter::Mixed),
            Err(SessionError::InvalidTransition { phase: "active", .. })
        ));
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let mut state = active_state();
        assert!(matches!(
            state.select("z"),
            Err(SessionError::InvalidOption(_))
        ));
        assert!(matches!(
            state.select_index(9),
            Err(SessionError::InvalidOptionIndex(9))
        ));
        assert_eq!(state.active().unwrap().selected, None);
    }

    #[test]
    fn test_submit_requires_selection() {
        let state = active_state();
        assert!(matches!(state.submission(), Err(SessionError::NoSelection)));
    }

    #[test]
    fn test_continue_replaces_question_and_clears_selection() {
        let mut state = active_state();
        state.select_index(1).unwrap();
        assert_eq!(state.submission().unwrap().selected_option, "b");

        state
            .submitted(SubmitAnswerResponse::Continue {
                question: question("q2"),
                next_difficulty: Some(3),
            })
            .unwrap();

        let active = state.active().unwrap();
        assert_eq!(active.question.id, "q2");
        assert_eq!(active.selected, None);
        assert_eq!(active.answered, 1);
        assert_eq!(active.difficulty, Some(3));
    }

    #[test]
    fn test_complete_stores_outcome() {
        let mut state = active_state();
        state.select("b").unwrap();
        let outcome = TestOutcome {
            score: 100.0,
            correct_questions: 1,
            total_questions: 1,
        };
        state
            .submitted(SubmitAnswerResponse::Complete(outcome))
            .unwrap();
        assert_eq!(state.phase(), &TestPhase::Complete(outcome));
    }

    #[test]
    fn test_submit_failure_keeps_question_and_selection() {
        let mut state = active_state();
        state.select("c").unwrap();
        state.submit_failed("Error: timeout").unwrap();

        let active = state.active().unwrap();
        assert_eq!(active.question.id, "q1");
        assert_eq!(active.selected.as_deref(), Some("c"));
        assert_eq!(state.last_error(), Some("Error: timeout"));

        // A new selection clears the banner
        state.select("d").unwrap();
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_start_failure_then_retry() {
        let mut state = TestState::new();
        state.begin_start(SectionFilter::Mixed).unwrap();
        state.start_failed("No questions available").unwrap();
        assert_eq!(
            state.phase(),
            &TestPhase::Error("No questions available".to_string())
        );

        state.begin_start(SectionFilter::Technical).unwrap();
        assert_eq!(state.phase(), &TestPhase::Loading);
    }

    #[test]
    fn test_reset_from_complete() {
        let mut state = active_state();
        state.select("a").unwrap();
        state
            .submitted(SubmitAnswerResponse::Complete(TestOutcome {
                score: 0.0,
                correct_questions: 0,
                total_questions: 1,
            }))
            .unwrap();

        assert!(state.begin_start(SectionFilter::Mixed).is_err());
        state.reset();
        assert_eq!(state, TestState::new());
    }
}
