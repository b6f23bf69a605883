//! Behavioral tests for the polling controller.
//!
//! All timing runs on tokio's paused virtual clock
//! (`#[tokio::test(start_paused = true)]`), so cadence, retry delays, and
//! escalation times are asserted exactly, in virtual milliseconds.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use todo_api::Todo;
use todo_stream::{
    FetchError, PollSettings, PollerConfig, PollerState, RecoveryAction, TodoPoller, TodoSource,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn sample_todos() -> Vec<Todo> {
    vec![Todo {
        id: Uuid::nil(),
        title: "Buy milk".to_string(),
        is_done: false,
    }]
}

type FetchResult = Result<Vec<Todo>, FetchError>;

fn ok() -> FetchResult {
    Ok(sample_todos())
}

fn err() -> FetchResult {
    Err(FetchError::Network("connection refused".to_string()))
}

/// Scripted fetch collaborator.
///
/// Records the virtual time of every call, serves outcomes from a script
/// (falling back to a fixed outcome once the script is exhausted), and
/// tracks how many calls were ever in flight at once.
struct ScriptedSource {
    epoch: Instant,
    delay: Duration,
    script: Mutex<VecDeque<FetchResult>>,
    fallback: FetchResult,
    calls: Mutex<Vec<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: Vec<FetchResult>, fallback: FetchResult, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            epoch: Instant::now(),
            delay,
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn always_ok() -> Arc<Self> {
        Self::new(Vec::new(), ok(), ms(0))
    }

    fn always_failing() -> Arc<Self> {
        Self::new(Vec::new(), err(), ms(0))
    }

    fn slow_ok(delay: Duration) -> Arc<Self> {
        Self::new(Vec::new(), ok(), delay)
    }

    fn scripted(script: Vec<FetchResult>, fallback: FetchResult) -> Arc<Self> {
        Self::new(script, fallback, ms(0))
    }

    fn call_times(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TodoSource for ScriptedSource {
    async fn fetch_all(&self) -> FetchResult {
        self.calls.lock().unwrap().push(self.epoch.elapsed());

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_in_flight.fetch_max(current, Ordering::Relaxed);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Records every invocation of the recovery action with its virtual time.
struct RecoveryProbe {
    epoch: Instant,
    calls: Mutex<Vec<Duration>>,
}

impl RecoveryProbe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            epoch: Instant::now(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn action(self: &Arc<Self>) -> RecoveryAction {
        let probe = Arc::clone(self);
        Arc::new(move || probe.calls.lock().unwrap().push(probe.epoch.elapsed()))
    }

    fn times(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn spawn_poller(
    source: &Arc<ScriptedSource>,
    initial: PollSettings,
) -> (TodoPoller, watch::Sender<PollSettings>, Arc<RecoveryProbe>) {
    let (settings_tx, settings_rx) = watch::channel(initial);
    let recovery = RecoveryProbe::new();
    let poller = TodoPoller::spawn(
        Arc::clone(source) as Arc<dyn TodoSource>,
        settings_rx,
        recovery.action(),
    );
    (poller, settings_tx, recovery)
}

// Polling disabled throughout: the output stream never emits and the fetch
// collaborator is never called.
#[tokio::test(start_paused = true)]
async fn disabled_polling_never_fetches_or_emits() {
    let source = ScriptedSource::always_ok();
    let (poller, _settings_tx, recovery) =
        spawn_poller(&source, PollSettings::disabled(ms(5000)));

    let mut sub = poller.subscribe();
    let outcome = tokio::time::timeout(ms(60_000), sub.recv()).await;

    assert!(outcome.is_err(), "nothing must be emitted while disabled");
    assert_eq!(source.call_count(), 0);
    assert_eq!(recovery.count(), 0);
    assert_eq!(poller.state(), PollerState::Idle);
}

// Enablement triggers exactly one immediate fetch, with no initial delay.
#[tokio::test(start_paused = true)]
async fn enabling_polling_fetches_immediately() {
    let source = ScriptedSource::always_ok();
    let (poller, _settings_tx, _recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();
    let first = sub.recv().await.unwrap().unwrap();

    assert_eq!(first, sample_todos());
    assert_eq!(source.call_times(), vec![ms(0)]);
}

// With fast fetches, attempts land at 0, I, 2I, ... measured from the start
// of each cycle.
#[tokio::test(start_paused = true)]
async fn fetches_follow_the_configured_cadence() {
    let source = ScriptedSource::always_ok();
    let (poller, _settings_tx, _recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();
    for _ in 0..3 {
        sub.recv().await.unwrap().unwrap();
    }

    assert_eq!(source.call_times(), vec![ms(0), ms(5000), ms(10_000)]);
}

// An attempt that outlives the interval swallows the tick that fired during
// it: the next attempt starts at the next multiple of the interval, and no
// two attempts ever overlap.
#[tokio::test(start_paused = true)]
async fn overlapped_tick_is_skipped_not_queued() {
    let source = ScriptedSource::slow_ok(ms(7000));
    let (poller, _settings_tx, _recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();
    sub.recv().await.unwrap().unwrap();
    sub.recv().await.unwrap().unwrap();

    assert_eq!(source.call_times(), vec![ms(0), ms(10_000)]);
    assert_eq!(source.max_in_flight(), 1);
}

// A failed fetch is retried after the fixed 1000 ms delay; a success ends
// the failure episode without touching the recovery action.
#[tokio::test(start_paused = true)]
async fn failed_fetch_retries_after_fixed_delay() {
    let source = ScriptedSource::scripted(vec![err(), ok()], ok());
    let (poller, _settings_tx, recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(20_000)));

    let mut sub = poller.subscribe();
    let first = sub.recv().await.unwrap().unwrap();

    assert_eq!(first, sample_todos());
    assert_eq!(source.call_times(), vec![ms(0), ms(1000)]);
    assert_eq!(recovery.count(), 0);
}

// Six straight failures (initial attempt + 5 retries) exhaust the budget:
// the recovery action fires exactly once at t=5000, the stream ends with
// the terminal error, and no further attempt is ever made.
#[tokio::test(start_paused = true)]
async fn retry_exhaustion_escalates_once_and_ends_the_stream() {
    let source = ScriptedSource::always_failing();
    let (poller, _settings_tx, recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(1000)));

    let mut sub = poller.subscribe();
    let terminal = sub.recv().await.unwrap().unwrap_err();

    assert_eq!(terminal.attempts, 6);
    assert_eq!(
        terminal.last_error,
        FetchError::Network("connection refused".to_string())
    );
    assert_eq!(sub.recv().await, None, "stream must end after the error");

    assert_eq!(
        source.call_times(),
        vec![ms(0), ms(1000), ms(2000), ms(3000), ms(4000), ms(5000)]
    );
    assert_eq!(recovery.times(), vec![ms(5000)]);
    assert_eq!(poller.state(), PollerState::FailedTerminal);

    // A subscriber arriving after the failure sees the error replayed.
    let mut stale_sub = poller.subscribe();
    assert!(stale_sub.recv().await.unwrap().is_err());

    // No sixth retry, no fresh cycle without a settings change.
    tokio::time::sleep(ms(60_000)).await;
    assert_eq!(source.call_count(), 6);
    assert_eq!(recovery.count(), 1);
}

// Late subscribers immediately observe the most recent list and cause no
// additional fetch; all consumers share one cycle.
#[tokio::test(start_paused = true)]
async fn late_subscribers_replay_latest_without_refetch() {
    let source = ScriptedSource::always_ok();
    let (poller, _settings_tx, _recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut early = poller.subscribe();
    let first = early.recv().await.unwrap().unwrap();

    tokio::time::sleep(ms(2000)).await;

    let mut second = poller.subscribe();
    let mut third = poller.subscribe();

    assert_eq!(second.recv().await.unwrap().unwrap(), first);
    assert_eq!(third.recv().await.unwrap().unwrap(), first);
    assert_eq!(source.call_count(), 1);
    assert_eq!(poller.latest(), Some(first));
}

// A distinct settings change cancels the pending timer and restarts the
// cycle from the immediate-fetch step with the new cadence.
#[tokio::test(start_paused = true)]
async fn settings_change_restarts_the_cycle_immediately() {
    let source = ScriptedSource::always_ok();
    let (poller, settings_tx, _recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();
    sub.recv().await.unwrap().unwrap();

    tokio::time::sleep(ms(1200)).await;
    settings_tx.send(PollSettings::enabled(ms(2000))).unwrap();

    sub.recv().await.unwrap().unwrap();
    sub.recv().await.unwrap().unwrap();

    assert_eq!(source.call_times(), vec![ms(0), ms(1200), ms(3200)]);
}

// Re-emitting the identical settings value is not a change and must not
// restart the cycle.
#[tokio::test(start_paused = true)]
async fn unchanged_settings_do_not_restart_the_cycle() {
    let source = ScriptedSource::always_ok();
    let (poller, settings_tx, _recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();
    sub.recv().await.unwrap().unwrap();

    tokio::time::sleep(ms(1200)).await;
    settings_tx.send(PollSettings::enabled(ms(5000))).unwrap();

    sub.recv().await.unwrap().unwrap();

    assert_eq!(source.call_times(), vec![ms(0), ms(5000)]);
}

// Disabling polling parks the controller: no further fetches, no emissions,
// until settings change again.
#[tokio::test(start_paused = true)]
async fn disabling_polling_goes_idle() {
    let source = ScriptedSource::always_ok();
    let (poller, settings_tx, recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();
    sub.recv().await.unwrap().unwrap();

    tokio::time::sleep(ms(1000)).await;
    settings_tx.send(PollSettings::disabled(ms(5000))).unwrap();

    let outcome = tokio::time::timeout(ms(60_000), sub.recv()).await;
    assert!(outcome.is_err());
    assert_eq!(source.call_count(), 1);
    assert_eq!(recovery.count(), 0);
    assert_eq!(poller.state(), PollerState::Idle);
}

// Disabling mid-episode abandons a pending retry wait: the failure episode
// simply evaporates, without escalation and without surfacing the error.
#[tokio::test(start_paused = true)]
async fn disabling_mid_retry_abandons_the_retry() {
    let source = ScriptedSource::always_failing();
    let (poller, settings_tx, recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(5000)));

    let mut sub = poller.subscribe();

    // First attempt fails at t=0; the retry is scheduled for t=1000.
    tokio::time::sleep(ms(500)).await;
    settings_tx.send(PollSettings::disabled(ms(5000))).unwrap();

    let outcome = tokio::time::timeout(ms(60_000), sub.recv()).await;
    assert!(outcome.is_err(), "transient errors must stay invisible");
    assert_eq!(source.call_count(), 1);
    assert_eq!(recovery.count(), 0);
}

// The retry budget is per failure episode: a success resets it, so a later
// episode gets the full five retries again even if earlier ones were spent.
#[tokio::test(start_paused = true)]
async fn retry_budget_resets_after_a_successful_fetch() {
    let source = ScriptedSource::scripted(
        vec![err(), ok(), err(), err(), err(), err(), err(), ok()],
        ok(),
    );
    let (poller, _settings_tx, recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(20_000)));

    let mut sub = poller.subscribe();
    sub.recv().await.unwrap().unwrap();
    sub.recv().await.unwrap().unwrap();

    assert_eq!(
        source.call_times(),
        vec![
            ms(0),
            ms(1000),
            ms(20_000),
            ms(21_000),
            ms(22_000),
            ms(23_000),
            ms(24_000),
            ms(25_000),
        ]
    );
    assert_eq!(recovery.count(), 0);
}

// After a terminal failure, a settings change restarts polling from the
// immediate-fetch step; subscribers from before the failure stay ended, and
// fresh subscribers see the new values.
#[tokio::test(start_paused = true)]
async fn settings_change_restarts_after_terminal_failure() {
    let source = ScriptedSource::scripted(
        vec![err(), err(), err(), err(), err(), err()],
        ok(),
    );
    let (poller, settings_tx, recovery) =
        spawn_poller(&source, PollSettings::enabled(ms(1000)));

    let mut old_sub = poller.subscribe();
    assert!(old_sub.recv().await.unwrap().is_err());
    assert_eq!(old_sub.recv().await, None);

    // A subscriber arriving between failure and restart sees the terminal
    // error replayed and ends.
    let mut stale_sub = poller.subscribe();
    assert!(stale_sub.recv().await.unwrap().is_err());
    assert_eq!(stale_sub.recv().await, None);

    tokio::time::sleep(ms(100)).await;
    settings_tx.send(PollSettings::enabled(ms(2000))).unwrap();

    // Let the controller process the restart and the immediate fetch before
    // attaching, so the replay cell holds the fresh list, not the old error.
    tokio::time::sleep(ms(10)).await;

    let mut fresh_sub = poller.subscribe();
    let list = fresh_sub.recv().await.unwrap().unwrap();

    assert_eq!(list, sample_todos());
    assert_eq!(recovery.count(), 1, "recovery fires once per episode");
    assert_eq!(source.call_times().last(), Some(&ms(5100)));
}

// Custom retry policies are honored.
#[tokio::test(start_paused = true)]
async fn custom_retry_policy_is_applied() {
    let source = ScriptedSource::always_failing();
    let (settings_tx, settings_rx) = watch::channel(PollSettings::enabled(ms(10_000)));
    let recovery = RecoveryProbe::new();
    let poller = TodoPoller::with_config(
        Arc::clone(&source) as Arc<dyn TodoSource>,
        settings_rx,
        recovery.action(),
        PollerConfig {
            retry_delay: ms(200),
            max_retries: 2,
        },
    );

    let mut sub = poller.subscribe();
    let terminal = sub.recv().await.unwrap().unwrap_err();

    assert_eq!(terminal.attempts, 3);
    assert_eq!(source.call_times(), vec![ms(0), ms(200), ms(400)]);
    assert_eq!(recovery.times(), vec![ms(400)]);

    drop(settings_tx);
}
