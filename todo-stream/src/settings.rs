//! Polling settings consumed by the controller.

use std::time::Duration;

/// Settings driving the polling loop.
///
/// Produced externally as a continuous stream (`tokio::sync::watch`); the
/// controller reacts to the latest value only. `PartialEq` is what lets the
/// controller drop consecutive identical emissions instead of restarting
/// the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Whether the background refresh loop runs at all.
    pub is_polling_enabled: bool,
    /// Time between the starts of two consecutive fetch cycles.
    pub polling_interval: Duration,
}

impl PollSettings {
    /// Polling enabled at the given interval.
    pub fn enabled(polling_interval: Duration) -> Self {
        Self {
            is_polling_enabled: true,
            polling_interval,
        }
    }

    /// Polling disabled. The interval is kept so re-enabling resumes at the
    /// previous cadence.
    pub fn disabled(polling_interval: Duration) -> Self {
        Self {
            is_polling_enabled: false,
            polling_interval,
        }
    }
}

impl Default for PollSettings {
    /// Disabled, with a 5 second cadence once enabled.
    fn default() -> Self {
        Self::disabled(Duration::from_secs(5))
    }
}
