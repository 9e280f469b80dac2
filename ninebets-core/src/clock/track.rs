//! Fixed-duration round track definitions.

use serde::{Deserialize, Serialize};

/// A repeating round of fixed duration, e.g. the one-minute track.
///
/// Tracks are immutable once configured; the clock derives every track's
/// countdown from the same shared epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundTrack {
    /// Display label such as `"1min"`
    pub label: String,
    /// Round length in seconds
    pub period_seconds: u32,
}

impl RoundTrack {
    /// Creates a track with the given label and round length.
    pub fn new(label: impl Into<String>, period_seconds: u32) -> Self {
        Self {
            label: label.into(),
            period_seconds,
        }
    }
}

impl std::fmt::Display for RoundTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}s)", self.label, self.period_seconds)
    }
}
