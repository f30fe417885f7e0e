//! Proctoring signal collection during an active test.
//!
//! This module provides:
//! - [`ProctorCollector`], which records violations from a [`SignalHub`]
//! - Scoped camera acquisition through [`MediaDevices`]
//! - A pure [`aggregate`] over the violation log

pub mod collector;
pub mod media;
pub mod models;

pub use collector::{ProctorCollector, ProctorError, ProctorResult, ProctorSignal, SignalHub};
pub use media::{MediaDevices, MediaError, MediaStream, MediaTrack, NoCamera, VideoConstraints};
pub use models::{Violation, ViolationCounts, ViolationKind, ViolationSummary, aggregate};
