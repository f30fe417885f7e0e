//! Drives a [`TestState`] against the backend.

use super::models::{
    SectionFilter, StartTestResponse, SubmitAnswerRequest, SubmitAnswerResponse,
};
use super::state_machine::{SessionError, SessionResult, TestPhase, TestState};
use crate::api::ApiResult;
use crate::single_flight::SingleFlight;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The two calls an adaptive test needs
#[async_trait]
pub trait TestBackend: Send + Sync {
    async fn start_test(&self, section: SectionFilter) -> ApiResult<StartTestResponse>;

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> ApiResult<SubmitAnswerResponse>;
}

#[async_trait]
impl<T: TestBackend + ?Sized> TestBackend for Arc<T> {
    async fn start_test(&self, section: SectionFilter) -> ApiResult<StartTestResponse> {
        (**self).start_test(section).await
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> ApiResult<SubmitAnswerResponse> {
        (**self).submit_answer(request).await
    }
}

/// One adaptive test from start to result.
///
/// At most one start or submit is outstanding at a time; a second call while
/// one is pending fails with [`SessionError::RequestInFlight`]. [`reset`]
/// orphans any pending call so its response is dropped with
/// [`SessionError::Stale`] instead of overwriting the fresh state.
///
/// [`reset`]: TestSessionFlow::reset
pub struct TestSessionFlow<B> {
    backend: B,
    state: Mutex<TestState>,
    flight: SingleFlight,
}

impl<B: TestBackend> TestSessionFlow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(TestState::new()),
            flight: SingleFlight::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, TestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the full state for rendering
    pub fn snapshot(&self) -> TestState {
        self.state().clone()
    }

    pub fn phase(&self) -> TestPhase {
        self.state().phase().clone()
    }

    /// True while a start or submit is awaiting the backend
    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Begin a test in `section`.
    ///
    /// # Errors
    ///
    /// * `SessionError::RequestInFlight` - Another call is pending
    /// * `SessionError::InvalidTransition` - A test is already running
    /// * `SessionError::Api` - Backend refused; the phase is now `Error`
    /// * `SessionError::Stale` - The flow was reset while waiting
    pub async fn start(&self, section: SectionFilter) -> SessionResult<TestPhase> {
        let flight = self
            .flight
            .try_begin()
            .ok_or(SessionError::RequestInFlight)?;
        self.state().begin_start(section)?;
        log::info!("Starting {section} test");

        let result = self.backend.start_test(section).await;

        let mut state = self.state();
        if !flight.is_current() {
            log::debug!("Dropping start response for a test that was reset");
            return Err(SessionError::Stale);
        }

        match result {
            Ok(response) => {
                log::info!("Test session {} started", response.session_id);
                state.started(response)?;
                Ok(state.phase().clone())
            }
            Err(e) => {
                log::warn!("Test start failed: {e}");
                state.start_failed(e.user_message())?;
                Err(e.into())
            }
        }
    }

    /// Select an option of the current question
    pub fn select(&self, option: &str) -> SessionResult<()> {
        if self.flight.is_busy() {
            return Err(SessionError::RequestInFlight);
        }
        self.state().select(option)
    }

    /// Select by zero-based position
    pub fn select_index(&self, index: usize) -> SessionResult<()> {
        if self.flight.is_busy() {
            return Err(SessionError::RequestInFlight);
        }
        self.state().select_index(index)
    }

    /// Submit the selected answer.
    ///
    /// A failed submit leaves the question and selection in place so the
    /// student can try again.
    ///
    /// # Errors
    ///
    /// * `SessionError::RequestInFlight` - Another call is pending
    /// * `SessionError::NoSelection` - Nothing selected yet
    /// * `SessionError::Api` - Backend call failed
    /// * `SessionError::Stale` - The flow was reset while waiting
    pub async fn submit(&self) -> SessionResult<TestPhase> {
        let flight = self
            .flight
            .try_begin()
            .ok_or(SessionError::RequestInFlight)?;
        let request = self.state().submission()?;
        log::debug!(
            "Submitting answer for question {} in session {}",
            request.question_id,
            request.session_id
        );

        let result = self.backend.submit_answer(&request).await;

        let mut state = self.state();
        if !flight.is_current() {
            log::debug!("Dropping submit response for a test that was reset");
            return Err(SessionError::Stale);
        }

        match result {
            Ok(response) => {
                if let SubmitAnswerResponse::Complete(outcome) = &response {
                    log::info!(
                        "Test complete: {}/{} correct, score {}",
                        outcome.correct_questions,
                        outcome.total_questions,
                        outcome.score
                    );
                }
                state.submitted(response)?;
                Ok(state.phase().clone())
            }
            Err(e) => {
                log::warn!("Submit failed: {e}");
                state.submit_failed(e.user_message())?;
                Err(e.into())
            }
        }
    }

    /// Back to idle; any pending response is discarded when it arrives
    pub fn reset(&self) {
        let mut state = self.state();
        self.flight.invalidate();
        state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::test_session::models::{TestOutcome, TestQuestion};
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    fn question(id: &str) -> TestQuestion {
        TestQuestion {
            id: id.to_string(),
            text: "Pick one".to_string(),
            options: vec!["a".into(), "b".into()],
            topic: None,
            difficulty: Some(2),
            category: None,
        }
    }

    /// Scripted backend; optionally parks each call until released
    #[derive(Default)]
    struct Scripted {
        submits: Mutex<VecDeque<ApiResult<SubmitAnswerResponse>>>,
        gate: Option<Arc<Notify>>,
        seen: Mutex<Vec<SubmitAnswerRequest>>,
    }

    #[async_trait]
    impl TestBackend for Scripted {
        async fn start_test(&self, _section: SectionFilter) -> ApiResult<StartTestResponse> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(StartTestResponse {
                session_id: "s1".to_string(),
                question: question("q1"),
            })
        }

        async fn submit_answer(
            &self,
            request: &SubmitAnswerRequest,
        ) -> ApiResult<SubmitAnswerResponse> {
            self.seen.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.submits
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Timeout))
        }
    }

    #[tokio::test]
    async fn test_full_run_to_complete() {
        let backend = Scripted::default();
        backend
            .submits
            .lock()
            .unwrap()
            .push_back(Ok(SubmitAnswerResponse::Complete(TestOutcome {
                score: 100.0,
                correct_questions: 1,
                total_questions: 1,
            })));
        let flow = TestSessionFlow::new(backend);

        flow.start(SectionFilter::General).await.unwrap();
        flow.select("b").unwrap();
        let phase = flow.submit().await.unwrap();

        assert!(matches!(phase, TestPhase::Complete(o) if o.score == 100.0));
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_selection() {
        let flow = TestSessionFlow::new(Scripted::default());
        flow.start(SectionFilter::Mixed).await.unwrap();
        flow.select("a").unwrap();

        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Timeout)));

        let snapshot = flow.snapshot();
        let active = snapshot.active().unwrap();
        assert_eq!(active.question.id, "q1");
        assert_eq!(active.selected.as_deref(), Some("a"));
        assert!(snapshot.last_error().is_some());
    }

    #[tokio::test]
    async fn test_second_submit_while_pending_is_refused() {
        let gate = Arc::new(Notify::new());
        let backend = Scripted {
            gate: Some(gate.clone()),
            ..Scripted::default()
        };
        backend
            .submits
            .lock()
            .unwrap()
            .push_back(Ok(SubmitAnswerResponse::Continue {
                question: question("q2"),
                next_difficulty: Some(3),
            }));
        let flow = Arc::new(TestSessionFlow::new(backend));

        gate.notify_one();
        flow.start(SectionFilter::Mixed).await.unwrap();
        flow.select("a").unwrap();

        let pending = tokio::spawn({
            let flow = flow.clone();
            async move { flow.submit().await }
        });
        while !flow.is_busy() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            flow.submit().await,
            Err(SessionError::RequestInFlight)
        ));
        assert!(matches!(
            flow.select("b"),
            Err(SessionError::RequestInFlight)
        ));

        gate.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(flow.backend.seen.lock().unwrap().len(), 1);
        assert_eq!(flow.snapshot().active().unwrap().question.id, "q2");
    }

    #[tokio::test]
    async fn test_reset_discards_pending_start() {
        let gate = Arc::new(Notify::new());
        let flow = Arc::new(TestSessionFlow::new(Scripted {
            gate: Some(gate.clone()),
            ..Scripted::default()
        }));

        let pending = tokio::spawn({
            let flow = flow.clone();
            async move { flow.start(SectionFilter::General).await }
        });
        while !flow.is_busy() {
            tokio::task::yield_now().await;
        }

        flow.reset();
        assert!(!flow.is_busy());
        gate.notify_one();

        assert!(matches!(
            pending.await.unwrap(),
            Err(SessionError::Stale)
        ));
        assert_eq!(flow.phase(), TestPhase::Idle);
    }
}
