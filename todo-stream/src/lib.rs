//! # todo-stream
//!
//! The polling controller for the todo SDK: given a stream of settings, it
//! produces a shared stream of "latest fetched list" events, applying
//! polling cadence, fetch deduplication, retry-with-backoff, and failure
//! escalation.
//!
//! The controller is an explicit state machine
//! (`Idle | AwaitingTick | Fetching | RetryWaiting | FailedTerminal`)
//! driven by three external events: a settings change, a timer tick, and the
//! resolution of a fetch attempt. It runs as one background task; all
//! consumers share that single task and its single in-flight fetch.

mod error;
mod poller;
mod settings;
mod source;

pub use error::{FetchError, TerminalError};
pub use poller::{PollerConfig, PollerState, RecoveryAction, TodoPoller, TodoSubscriber};
pub use settings::PollSettings;
pub use source::TodoSource;
