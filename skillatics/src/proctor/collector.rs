//! Turns environment signals into a violation log while a test is active.

use super::media::{MediaDevices, MediaError, MediaStream, VideoConstraints};
use super::models::{Violation, ViolationCounts, ViolationKind, ViolationSummary, aggregate};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Raw environment events the collector listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProctorSignal {
    VisibilityChanged { hidden: bool },
    WindowBlur,
    FullscreenChanged { fullscreen: bool },
    Copy,
    Paste,
}

/// Fan-out point for [`ProctorSignal`]s; the UI emits, collectors subscribe
#[derive(Debug, Clone)]
pub struct SignalHub {
    tx: broadcast::Sender<ProctorSignal>,
}

impl SignalHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a signal; returns how many subscribers saw it
    pub fn emit(&self, signal: ProctorSignal) -> usize {
        self.tx.send(signal).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProctorSignal> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[derive(Debug, Error)]
pub enum ProctorError {
    #[error("collector is not active")]
    Inactive,
    #[error("signal hub closed")]
    HubClosed,
    #[error(transparent)]
    Media(#[from] MediaError),
}

pub type ProctorResult<T> = Result<T, ProctorError>;

type ViolationCallback = Box<dyn Fn(&Violation) + Send + Sync>;

/// Records violations while active; never blocks or ends the test itself.
///
/// Each activation holds exactly one hub subscription and at most one camera
/// stream. Both are released by [`deactivate`] and by `Drop`.
///
/// [`deactivate`]: ProctorCollector::deactivate
pub struct ProctorCollector {
    devices: Arc<dyn MediaDevices>,
    subscription: Option<broadcast::Receiver<ProctorSignal>>,
    stream: Option<MediaStream>,
    violations: Vec<Violation>,
    counts: ViolationCounts,
    on_violation: Option<ViolationCallback>,
}

impl ProctorCollector {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            subscription: None,
            stream: None,
            violations: Vec::new(),
            counts: ViolationCounts::default(),
            on_violation: None,
        }
    }

    /// Invoke `callback` for every recorded violation
    pub fn with_callback(mut self, callback: impl Fn(&Violation) + Send + Sync + 'static) -> Self {
        self.on_violation = Some(Box::new(callback));
        self
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn has_camera(&self) -> bool {
        self.stream.as_ref().is_some_and(MediaStream::is_live)
    }

    /// Start listening on `hub` and request the camera.
    ///
    /// Calling this while already active does nothing. Each new activation
    /// starts an empty log. A camera failure is recorded as `webcam_denied`
    /// and the collector stays active.
    pub async fn activate(&mut self, hub: &SignalHub) {
        if self.is_active() {
            return;
        }
        self.violations.clear();
        self.counts = ViolationCounts::default();
        self.subscription = Some(hub.subscribe());
        log::info!("Proctoring active");

        match self.devices.request_video(VideoConstraints::default()).await {
            Ok(stream) => {
                log::debug!("Camera acquired ({} track(s))", stream.track_count());
                self.stream = Some(stream);
            }
            Err(e) => {
                log::warn!("Camera unavailable: {e}");
                self.record(ViolationKind::WebcamDenied);
            }
        }
    }

    /// Stop the camera and drop the subscription; safe to call repeatedly
    pub fn deactivate(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        if self.subscription.take().is_some() {
            log::info!(
                "Proctoring stopped with {} violation(s)",
                self.violations.len()
            );
        }
    }

    fn record(&mut self, kind: ViolationKind) -> Violation {
        let violation = Violation::new(kind);
        log::warn!("Proctoring violation: {}", violation.description);
        self.counts.add(kind);
        if let Some(callback) = &self.on_violation {
            callback(&violation);
        }
        self.violations.push(violation.clone());
        violation
    }

    /// Translate one signal; inactive collectors and benign signals record nothing
    pub fn handle(&mut self, signal: ProctorSignal) -> Option<Violation> {
        if !self.is_active() {
            return None;
        }
        let kind = match signal {
            ProctorSignal::VisibilityChanged { hidden: true } => ViolationKind::TabSwitch,
            ProctorSignal::WindowBlur => ViolationKind::WindowBlur,
            ProctorSignal::FullscreenChanged { fullscreen: false } => ViolationKind::ExitFullscreen,
            ProctorSignal::Copy => ViolationKind::CopyAttempt,
            ProctorSignal::Paste => ViolationKind::PasteAttempt,
            ProctorSignal::VisibilityChanged { hidden: false }
            | ProctorSignal::FullscreenChanged { fullscreen: true } => return None,
        };
        Some(self.record(kind))
    }

    /// Drain signals already queued on the subscription without waiting.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of violations recorded
    pub fn pump(&mut self) -> usize {
        let mut recorded = 0;
        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                return recorded;
            };
            match subscription.try_recv() {
                Ok(signal) => {
                    if self.handle(signal).is_some() {
                        recorded += 1;
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!("Proctoring fell behind, {missed} signal(s) lost");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return recorded,
            }
        }
    }

    /// Wait for the next signal that produces a violation.
    ///
    /// # Errors
    ///
    /// * `ProctorError::Inactive` - Collector is not active
    /// * `ProctorError::HubClosed` - Every hub handle was dropped
    pub async fn next_violation(&mut self) -> ProctorResult<Violation> {
        loop {
            let subscription = self.subscription.as_mut().ok_or(ProctorError::Inactive)?;
            match subscription.recv().await {
                Ok(signal) => {
                    if let Some(violation) = self.handle(signal) {
                        return Ok(violation);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("Proctoring fell behind, {missed} signal(s) lost");
                }
                Err(RecvError::Closed) => return Err(ProctorError::HubClosed),
            }
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn tab_switches(&self) -> usize {
        self.counts.tab_switches
    }

    /// Running tallies; no copy of the log
    pub fn counts(&self) -> ViolationCounts {
        self.counts
    }

    pub fn summary(&self) -> ViolationSummary {
        aggregate(&self.violations)
    }
}

impl Drop for ProctorCollector {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proctor::media::{MediaTrack, NoCamera};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Track(Arc<AtomicUsize>);

    impl MediaTrack for Track {
        fn kind(&self) -> &str {
            "video"
        }

        fn stop(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeCamera {
        stops: Arc<AtomicUsize>,
        requests: AtomicUsize,
    }

    #[async_trait]
    impl MediaDevices for FakeCamera {
        async fn request_video(
            &self,
            constraints: VideoConstraints,
        ) -> Result<MediaStream, MediaError> {
            assert!(!constraints.audio);
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(MediaStream::new(vec![Arc::new(Track(self.stops.clone()))]))
        }
    }

    fn fake_camera() -> (Arc<FakeCamera>, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        let camera = Arc::new(FakeCamera {
            stops: stops.clone(),
            requests: AtomicUsize::new(0),
        });
        (camera, stops)
    }

    #[tokio::test]
    async fn test_activate_then_deactivate_stops_camera() {
        let (camera, stops) = fake_camera();
        let mut collector = ProctorCollector::new(camera);

        collector.activate(&SignalHub::default()).await;
        assert!(collector.has_camera());
        collector.deactivate();

        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!collector.has_camera());
    }

    #[tokio::test]
    async fn test_reactivation_does_not_duplicate_subscription() {
        let (camera, _) = fake_camera();
        let hub = SignalHub::default();
        let mut collector = ProctorCollector::new(camera.clone());

        collector.activate(&hub).await;
        collector.activate(&hub).await;
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(camera.requests.load(Ordering::SeqCst), 1);

        hub.emit(ProctorSignal::Copy);
        assert_eq!(collector.pump(), 1);
        assert_eq!(collector.violations().len(), 1);

        collector.deactivate();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_denied_camera_is_recorded() {
        let mut collector = ProctorCollector::new(Arc::new(NoCamera));
        collector.activate(&SignalHub::default()).await;

        assert!(collector.is_active());
        assert_eq!(collector.violations()[0].kind, ViolationKind::WebcamDenied);
        assert_eq!(
            collector.violations()[0].description,
            "Webcam access was denied"
        );
    }

    #[tokio::test]
    async fn test_signal_mapping() {
        let hub = SignalHub::default();
        let mut collector = ProctorCollector::new(Arc::new(NoCamera));
        collector.activate(&hub).await;

        for signal in [
            ProctorSignal::VisibilityChanged { hidden: true },
            ProctorSignal::VisibilityChanged { hidden: false },
            ProctorSignal::WindowBlur,
            ProctorSignal::FullscreenChanged { fullscreen: true },
            ProctorSignal::FullscreenChanged { fullscreen: false },
            ProctorSignal::Paste,
        ] {
            hub.emit(signal);
        }
        assert_eq!(collector.pump(), 4);

        let kinds: Vec<_> = collector.violations().iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::WebcamDenied,
                ViolationKind::TabSwitch,
                ViolationKind::WindowBlur,
                ViolationKind::ExitFullscreen,
                ViolationKind::PasteAttempt,
            ]
        );
        assert_eq!(collector.tab_switches(), 1);
        assert_eq!(collector.summary().fullscreen_exits, 1);

        let counts = collector.counts();
        let summary = collector.summary();
        assert_eq!(counts.total_violations, summary.total_violations);
        assert_eq!(counts.tab_switches, summary.tab_switches);
        assert_eq!(counts.fullscreen_exits, summary.fullscreen_exits);
        assert_eq!(counts.paste_attempts, summary.paste_attempts);
        assert_eq!(counts, ViolationCounts::of(collector.violations()));
    }

    #[tokio::test]
    async fn test_second_activation_starts_fresh_log() {
        let hub = SignalHub::default();
        let mut collector = ProctorCollector::new(Arc::new(NoCamera));

        collector.activate(&hub).await;
        hub.emit(ProctorSignal::VisibilityChanged { hidden: true });
        hub.emit(ProctorSignal::Copy);
        assert_eq!(collector.pump(), 2);
        collector.deactivate();
        assert_eq!(collector.violations().len(), 3);

        collector.activate(&hub).await;
        let kinds: Vec<_> = collector.violations().iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::WebcamDenied]);
        assert_eq!(collector.tab_switches(), 0);
        assert_eq!(collector.counts().total_violations, 1);
    }

    #[tokio::test]
    async fn test_inactive_collector_ignores_signals() {
        let hub = SignalHub::default();
        let mut collector = ProctorCollector::new(Arc::new(NoCamera));
        assert_eq!(hub.emit(ProctorSignal::Copy), 0);
        assert!(collector.handle(ProctorSignal::Copy).is_none());
        assert!(matches!(
            collector.next_violation().await,
            Err(ProctorError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_callback_sees_each_violation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hub = SignalHub::default();
        let mut collector = ProctorCollector::new(Arc::new(NoCamera)).with_callback({
                let seen = seen.clone();
                move |v: &Violation| seen.lock().unwrap().push(v.kind)
        });
        collector.activate(&hub).await;

        hub.emit(ProctorSignal::Copy);
        let violation = collector.next_violation().await.unwrap();
        assert_eq!(violation.kind, ViolationKind::CopyAttempt);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ViolationKind::WebcamDenied, ViolationKind::CopyAttempt]
        );
    }

    #[tokio::test]
    async fn test_drop_releases_camera() {
        let (camera, stops) = fake_camera();
        {
            let mut collector = ProctorCollector::new(camera);
            collector.activate(&SignalHub::default()).await;
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
