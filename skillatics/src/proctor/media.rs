//! Camera acquisition behind a trait, so the collector can own a stream
//! without knowing where it comes from.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Capture request; proctoring only ever asks for small video, no audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub audio: bool,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            audio: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera available")]
    NoDevice,
    #[error("camera error: {0}")]
    Device(String),
}

/// One live capture track
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> &str;

    /// Release the device; [`MediaStream`] calls this exactly once
    fn stop(&self);
}

/// Owned set of tracks; stopping is idempotent and also happens on drop
pub struct MediaStream {
    tracks: Vec<Arc<dyn MediaTrack>>,
    stopped: bool,
}

impl MediaStream {
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            tracks,
            stopped: false,
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_live(&self) -> bool {
        !self.stopped
    }

    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        for track in &self.tracks {
            track.stop();
        }
        log::debug!("Stopped {} media track(s)", self.tracks.len());
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("tracks", &self.tracks.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn request_video(&self, constraints: VideoConstraints) -> Result<MediaStream, MediaError>;
}

/// Device set for builds without camera access; every request fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

#[async_trait]
impl MediaDevices for NoCamera {
    async fn request_video(&self, _constraints: VideoConstraints) -> Result<MediaStream, MediaError> {
        Err(MediaError::NoDevice)
    }
}
