//! Submitter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do when a line equal to one already in flight is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the second submission with `SubmitError::DuplicateRequest`.
    #[default]
    Reject,
    /// Track each submission separately by its `SubmissionId`.
    Allow,
}

/// Configuration for `CartLineSubmitter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitterConfig {
    /// Delay after a submission starts before the slow signal is raised
    /// if requests are still pending (ms). Default: 500.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    /// Duplicate in-flight line policy. Default: reject.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Capacity of the event broadcast channel. Default: 256.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_slow_threshold_ms() -> u64 {
    500
}

fn default_event_capacity() -> usize {
    256
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: default_slow_threshold_ms(),
            duplicate_policy: DuplicatePolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SubmitterConfig {
    /// Slow threshold as a `Duration`.
    #[must_use]
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }
}
