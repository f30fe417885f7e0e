//! Adaptive test session: begin, answer, receive the next question or the result.

pub mod flow;
pub mod models;
pub mod state_machine;

pub use flow::{TestBackend, TestSessionFlow};
pub use models::{
    SectionFilter, StartTestRequest, StartTestResponse, SubmitAnswerRequest,
    SubmitAnswerResponse, TestOutcome, TestQuestion,
};
pub use state_machine::{ActiveTest, SessionError, SessionResult, TestPhase, TestState};
