//! Violation records and their summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TabSwitch,
    WindowBlur,
    ExitFullscreen,
    CopyAttempt,
    PasteAttempt,
    WebcamDenied,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 6] = [
        ViolationKind::TabSwitch,
        ViolationKind::WindowBlur,
        ViolationKind::ExitFullscreen,
        ViolationKind::CopyAttempt,
        ViolationKind::PasteAttempt,
        ViolationKind::WebcamDenied,
    ];

    pub const fn description(self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "User switched away from test tab",
            ViolationKind::WindowBlur => "Test window lost focus",
            ViolationKind::ExitFullscreen => "User exited fullscreen mode",
            ViolationKind::CopyAttempt => "User attempted to copy content",
            ViolationKind::PasteAttempt => "User attempted to paste content",
            ViolationKind::WebcamDenied => "Webcam access was denied",
        }
    }

    pub const fn wire_name(self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "tab_switch",
            ViolationKind::WindowBlur => "window_blur",
            ViolationKind::ExitFullscreen => "exit_fullscreen",
            ViolationKind::CopyAttempt => "copy_attempt",
            ViolationKind::PasteAttempt => "paste_attempt",
            ViolationKind::WebcamDenied => "webcam_denied",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    pub fn new(kind: ViolationKind) -> Self {
        Self::at(kind, Utc::now())
    }

    pub fn at(kind: ViolationKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            description: kind.description().to_string(),
            timestamp,
        }
    }
}

/// Per-kind tallies, kept without the log for per-frame display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViolationCounts {
    pub total_violations: usize,
    pub tab_switches: usize,
    pub fullscreen_exits: usize,
    pub copy_attempts: usize,
    pub paste_attempts: usize,
}

impl ViolationCounts {
    pub fn add(&mut self, kind: ViolationKind) {
        self.total_violations += 1;
        match kind {
            ViolationKind::TabSwitch => self.tab_switches += 1,
            ViolationKind::ExitFullscreen => self.fullscreen_exits += 1,
            ViolationKind::CopyAttempt => self.copy_attempts += 1,
            ViolationKind::PasteAttempt => self.paste_attempts += 1,
            ViolationKind::WindowBlur | ViolationKind::WebcamDenied => {}
        }
    }

    pub fn of(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for violation in violations {
            counts.add(violation.kind);
        }
        counts
    }
}

/// Counts plus the ordered raw log, in the shape attached to a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub total_violations: usize,
    pub tab_switches: usize,
    pub fullscreen_exits: usize,
    pub copy_attempts: usize,
    pub paste_attempts: usize,
    pub violations_log: Vec<Violation>,
}

/// Summarize a violation log; same input, same output
pub fn aggregate(violations: &[Violation]) -> ViolationSummary {
    let counts = ViolationCounts::of(violations);

    ViolationSummary {
        total_violations: counts.total_violations,
        tab_switches: counts.tab_switches,
        fullscreen_exits: counts.fullscreen_exits,
        copy_attempts: counts.copy_attempts,
        paste_attempts: counts.paste_attempts,
        violations_log: violations.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kind_strategy() -> impl Strategy<Value = ViolationKind> {
        prop::sample::select(ViolationKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_aggregate_is_pure(kinds in prop::collection::vec(kind_strategy(), 0..40)) {
            let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
            let log: Vec<Violation> = kinds
                .iter()
                .enumerate()
                .map(|(i, k)| Violation::at(*k, base + chrono::Duration::seconds(i as i64)))
                .collect();
            let before = log.clone();

            let first = aggregate(&log);
            let second = aggregate(&log);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&log, &before);
            prop_assert_eq!(first.total_violations, log.len());
            prop_assert_eq!(&first.violations_log, &log);
            prop_assert!(
                first.tab_switches + first.fullscreen_exits + first.copy_attempts + first.paste_attempts
                    <= first.total_violations
            );

            let mut running = ViolationCounts::default();
            for k in &kinds {
                running.add(*k);
            }
            prop_assert_eq!(running, ViolationCounts::of(&log));
            prop_assert_eq!(running.tab_switches, first.tab_switches);
            prop_assert_eq!(running.paste_attempts, first.paste_attempts);
        }
    }

    #[test]
    fn test_aggregate_counts() {
        let log = vec![
            Violation::new(ViolationKind::TabSwitch),
            Violation::new(ViolationKind::WindowBlur),
            Violation::new(ViolationKind::TabSwitch),
            Violation::new(ViolationKind::PasteAttempt),
            Violation::new(ViolationKind::WebcamDenied),
        ];
        let summary = aggregate(&log);
        assert_eq!(summary.total_violations, 5);
        assert_eq!(summary.tab_switches, 2);
        assert_eq!(summary.paste_attempts, 1);
        assert_eq!(summary.copy_attempts, 0);
        assert_eq!(summary.fullscreen_exits, 0);
    }

    #[test]
    fn test_violation_wire_shape() {
        let ts = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let value = serde_json::to_value(Violation::at(ViolationKind::ExitFullscreen, ts)).unwrap();
        assert_eq!(value["type"], "exit_fullscreen");
        assert_eq!(value["description"], "User exited fullscreen mode");
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_empty_log() {
        assert_eq!(aggregate(&[]), ViolationSummary::default());
    }
}
