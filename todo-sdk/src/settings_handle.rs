//! Producer side of the settings stream feeding the polling controller.

use std::time::Duration;

use tokio::sync::watch;

use todo_stream::PollSettings;

/// Handle for publishing polling settings.
///
/// Wraps the `watch` sender whose receiver the controller consumes. Sending
/// the same value twice is harmless: the controller deduplicates unchanged
/// settings and does not restart its cycle for them.
#[derive(Debug)]
pub struct SettingsHandle {
    tx: watch::Sender<PollSettings>,
}

impl SettingsHandle {
    pub(crate) fn new(tx: watch::Sender<PollSettings>) -> Self {
        Self { tx }
    }

    /// The settings currently in effect.
    pub fn current(&self) -> PollSettings {
        self.tx.borrow().clone()
    }

    /// Replace the settings wholesale.
    pub fn apply(&self, settings: PollSettings) {
        // Send only fails when the controller is gone; nothing to do then.
        let _ = self.tx.send(settings);
    }

    /// Turn the polling loop on or off, keeping the current interval.
    pub fn set_polling_enabled(&self, enabled: bool) {
        let mut settings = self.current();
        settings.is_polling_enabled = enabled;
        self.apply(settings);
    }

    /// Change the polling cadence, keeping the current enabled state.
    pub fn set_polling_interval(&self, interval: Duration) {
        let mut settings = self.current();
        settings.polling_interval = interval;
        self.apply(settings);
    }
}
