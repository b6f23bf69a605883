//! The polling controller and its background task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use replay_channel::{ReplayChannel, Subscriber};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use todo_api::Todo;

use crate::error::TerminalError;
use crate::settings::PollSettings;
use crate::source::TodoSource;

/// Subscription to the shared stream of fetched todo lists.
pub type TodoSubscriber = Subscriber<Vec<Todo>, TerminalError>;

/// Action invoked exactly once per exhausted failure episode.
///
/// What recovery means (e.g. prompting a full reload) is up to the caller;
/// the controller only guarantees the single invocation.
pub type RecoveryAction = Arc<dyn Fn() + Send + Sync>;

/// Retry tunables for the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Fixed delay before each retry of a failed fetch.
    pub retry_delay: Duration,
    /// Retries allowed per failure episode, on top of the initial attempt.
    pub max_retries: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(1000),
            max_retries: 5,
        }
    }
}

/// States of the polling state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Polling disabled; waiting for a settings change.
    Idle,
    /// Episode active; waiting for the next scheduled tick.
    AwaitingTick,
    /// A fetch attempt is in flight.
    Fetching,
    /// A fetch failed; waiting out the fixed delay before the next retry.
    RetryWaiting,
    /// Retry budget exhausted; waiting for a settings change to restart.
    FailedTerminal,
}

/// Handle to a running polling controller.
///
/// Spawns the controller task on construction and keeps it alive. All
/// subscribers obtained from one handle share a single polling cycle and a
/// single in-flight fetch per tick; late subscribers immediately receive the
/// most recently fetched list.
///
/// Dropping the handle signals the task to shut down.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use tokio::sync::watch;
/// use todo_stream::{PollSettings, TodoPoller};
///
/// let (settings_tx, settings_rx) = watch::channel(PollSettings::default());
/// let poller = TodoPoller::spawn(source, settings_rx, Arc::new(|| {
///     eprintln!("polling gave up, reload the page");
/// }));
///
/// let mut todos = poller.subscribe();
/// while let Some(update) = todos.recv().await {
///     println!("{} todos", update?.len());
/// }
/// ```
pub struct TodoPoller {
    /// Shared output stream (multicast with replay of the last list).
    output: ReplayChannel<Vec<Todo>, TerminalError>,

    /// Current state of the state machine, for observability.
    state: Arc<RwLock<PollerState>>,

    /// Total fetch attempts issued, retries included.
    attempt_count: Arc<AtomicU64>,

    /// Shutdown signal sender.
    shutdown_tx: Option<mpsc::Sender<()>>,

    /// Controller task handle.
    task: Option<JoinHandle<()>>,
}

impl TodoPoller {
    /// Spawn a controller with the default retry policy (1000 ms fixed
    /// delay, 5 retries per episode).
    pub fn spawn(
        source: Arc<dyn TodoSource>,
        settings: watch::Receiver<PollSettings>,
        recovery: RecoveryAction,
    ) -> Self {
        Self::with_config(source, settings, recovery, PollerConfig::default())
    }

    /// Spawn a controller with a custom retry policy.
    pub fn with_config(
        source: Arc<dyn TodoSource>,
        settings: watch::Receiver<PollSettings>,
        recovery: RecoveryAction,
        config: PollerConfig,
    ) -> Self {
        let output = ReplayChannel::new();
        let state = Arc::new(RwLock::new(PollerState::Idle));
        let attempt_count = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        let runner = PollRunner {
            source,
            settings_rx: settings,
            recovery,
            config,
            output: output.clone(),
            state: Arc::clone(&state),
            attempt_count: Arc::clone(&attempt_count),
            shutdown_rx,
        };
        let task = tokio::spawn(runner.run());

        Self {
            output,
            state,
            attempt_count,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Subscribe to the shared output stream.
    ///
    /// If at least one fetch has succeeded, the subscriber immediately
    /// receives the most recent list; no fresh fetch is triggered.
    pub fn subscribe(&self) -> TodoSubscriber {
        self.output.subscribe()
    }

    /// The most recently fetched list, if any.
    pub fn latest(&self) -> Option<Vec<Todo>> {
        self.output.latest()
    }

    /// Current state of the polling state machine.
    pub fn state(&self) -> PollerState {
        self.state.read().map(|s| *s).unwrap_or(PollerState::Idle)
    }

    /// Total fetch attempts issued so far, retries included.
    pub fn attempt_count(&self) -> u64 {
        self.attempt_count.load(Ordering::Relaxed)
    }

    /// Whether the controller task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Shut the controller down and wait for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TodoPoller {
    fn drop(&mut self) {
        // Cannot await in Drop; the task notices the signal at its next
        // suspension point.
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.try_send(());
        }
    }
}

impl std::fmt::Debug for TodoPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoPoller")
            .field("state", &self.state())
            .field("attempt_count", &self.attempt_count())
            .field("is_running", &self.is_running())
            .finish()
    }
}

/// Why the controller woke up while waiting on external events.
enum Wake {
    /// A distinct settings value arrived.
    Settings(PollSettings),
    /// The settings sender was dropped.
    Closed,
    /// Explicit shutdown was requested.
    Shutdown,
}

/// Why an episode ended.
enum EpisodeEnd {
    Settings(PollSettings),
    Terminal(TerminalError),
    Stopped,
}

impl From<Wake> for EpisodeEnd {
    fn from(wake: Wake) -> Self {
        match wake {
            Wake::Settings(next) => EpisodeEnd::Settings(next),
            Wake::Closed | Wake::Shutdown => EpisodeEnd::Stopped,
        }
    }
}

/// Outcome of one attempt cycle (a fetch plus its retries).
enum AttemptOutcome {
    Success(Vec<Todo>),
    Terminal(TerminalError),
    Interrupted(Wake),
}

/// The controller task state.
struct PollRunner {
    source: Arc<dyn TodoSource>,
    settings_rx: watch::Receiver<PollSettings>,
    recovery: RecoveryAction,
    config: PollerConfig,
    output: ReplayChannel<Vec<Todo>, TerminalError>,
    state: Arc<RwLock<PollerState>>,
    attempt_count: Arc<AtomicU64>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl PollRunner {
    async fn run(mut self) {
        tracing::debug!("Todo poller started");

        let mut current = self.settings_rx.borrow_and_update().clone();
        loop {
            let end = if current.is_polling_enabled {
                self.run_episode(&current).await
            } else {
                self.set_state(PollerState::Idle);
                Self::next_wake(&mut self.settings_rx, &mut self.shutdown_rx, &current)
                    .await
                    .into()
            };

            match end {
                EpisodeEnd::Settings(next) => {
                    tracing::debug!(?next, "Settings changed, restarting cycle");
                    current = next;
                }
                EpisodeEnd::Terminal(error) => {
                    tracing::error!(%error, "Retry budget exhausted, escalating");
                    self.set_state(PollerState::FailedTerminal);
                    (self.recovery)();
                    self.output.fail(error);

                    match Self::next_wake(&mut self.settings_rx, &mut self.shutdown_rx, &current)
                        .await
                    {
                        Wake::Settings(next) => {
                            // A restart begins a fresh run of values; late
                            // subscribers must not see the stale error.
                            self.output.reset();
                            current = next;
                        }
                        Wake::Closed | Wake::Shutdown => break,
                    }
                }
                EpisodeEnd::Stopped => break,
            }
        }

        tracing::debug!("Todo poller stopped");
    }

    /// One polling episode: immediate fetch, then one attempt cycle per
    /// tick, until settings change or the retry budget is exhausted.
    async fn run_episode(&mut self, settings: &PollSettings) -> EpisodeEnd {
        tracing::debug!(
            interval_ms = settings.polling_interval.as_millis() as u64,
            "Starting polling episode"
        );

        // tokio's interval panics on a zero period
        let period = settings.polling_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        // A tick that fires while an attempt is still resolving is dropped,
        // not queued; the next tick stays on the original cadence.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // A change that raced with the end of the previous attempt may
            // not surface as a notification; the value check catches it.
            if let Some(next) = self.settings_drift(settings) {
                return EpisodeEnd::Settings(next);
            }

            self.set_state(PollerState::AwaitingTick);
            let wake = {
                tokio::select! {
                    _ = ticker.tick() => None,
                    wake = Self::next_wake(&mut self.settings_rx, &mut self.shutdown_rx, settings) => {
                        Some(wake)
                    }
                }
            };
            if let Some(wake) = wake {
                return wake.into();
            }

            // The tick and a settings change can land on the same instant;
            // the change wins and no attempt starts for the stale settings.
            if let Some(next) = self.settings_drift(settings) {
                return EpisodeEnd::Settings(next);
            }

            match self.attempt_cycle(settings).await {
                AttemptOutcome::Success(todos) => {
                    tracing::debug!(count = todos.len(), "Fetch succeeded");
                    self.output.publish(todos);
                }
                AttemptOutcome::Terminal(error) => return EpisodeEnd::Terminal(error),
                AttemptOutcome::Interrupted(wake) => return wake.into(),
            }
        }
    }

    /// One attempt cycle: a fetch, then up to `max_retries` retries, each
    /// preceded by the fixed retry delay. The retry budget is per cycle, so
    /// any successful fetch resets it.
    async fn attempt_cycle(&mut self, settings: &PollSettings) -> AttemptOutcome {
        let mut retries: u32 = 0;
        loop {
            self.set_state(PollerState::Fetching);
            self.attempt_count.fetch_add(1, Ordering::Relaxed);

            let source = Arc::clone(&self.source);
            let resolved = {
                let mut fetch = source.fetch_all();
                tokio::select! {
                    result = &mut fetch => Ok(result),
                    wake = Self::next_wake(&mut self.settings_rx, &mut self.shutdown_rx, settings) => {
                        Err(wake)
                    }
                }
            };
            // An already-dispatched fetch cannot be aborted mid-flight, but
            // dropping its future here means a late result is discarded.

            let result = match resolved {
                Ok(result) => result,
                Err(wake) => return AttemptOutcome::Interrupted(wake),
            };

            match result {
                Ok(todos) => return AttemptOutcome::Success(todos),
                Err(error) => {
                    if retries >= self.config.max_retries {
                        return AttemptOutcome::Terminal(TerminalError {
                            attempts: retries + 1,
                            last_error: error,
                        });
                    }
                    retries += 1;
                    tracing::warn!(
                        %error,
                        retry = retries,
                        max_retries = self.config.max_retries,
                        "Fetch failed, scheduling retry"
                    );

                    self.set_state(PollerState::RetryWaiting);
                    let wake = {
                        tokio::select! {
                            _ = tokio::time::sleep(self.config.retry_delay) => None,
                            wake = Self::next_wake(&mut self.settings_rx, &mut self.shutdown_rx, settings) => {
                                Some(wake)
                            }
                        }
                    };
                    if let Some(wake) = wake {
                        return AttemptOutcome::Interrupted(wake);
                    }
                }
            }
        }
    }

    /// The latest settings value, if it differs from the episode's.
    fn settings_drift(&self, settings: &PollSettings) -> Option<PollSettings> {
        let latest = self.settings_rx.borrow().clone();
        (latest != *settings).then_some(latest)
    }

    /// Wait for the next external event: a *distinct* settings value, the
    /// settings channel closing, or a shutdown signal. Emissions equal to
    /// `current` are swallowed here, which is what keeps unchanged settings
    /// from restarting the cycle.
    async fn next_wake(
        settings_rx: &mut watch::Receiver<PollSettings>,
        shutdown_rx: &mut mpsc::Receiver<()>,
        current: &PollSettings,
    ) -> Wake {
        loop {
            tokio::select! {
                changed = settings_rx.changed() => {
                    if changed.is_err() {
                        return Wake::Closed;
                    }
                    let next = settings_rx.borrow().clone();
                    if next != *current {
                        return Wake::Settings(next);
                    }
                }
                _ = shutdown_rx.recv() => return Wake::Shutdown,
            }
        }
    }

    fn set_state(&self, next: PollerState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }
}
