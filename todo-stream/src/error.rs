//! Error types for the todo-stream crate.
//!
//! Both types are `Clone`: a terminal failure is multicast to every
//! subscriber of the shared output stream.

/// A single fetch attempt failed.
///
/// Transient by definition; whether it stays transient is decided by the
/// retry loop, not by the error itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or the response not read
    #[error("Network error: {0}")]
    Network(String),

    /// The response arrived but did not decode
    #[error("Decode error: {0}")]
    Decode(String),
}

/// The retry budget for one failure episode is exhausted.
///
/// Surfaced to subscribers as the stream-ending error; the recovery action
/// has already been invoked when this is delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Polling failed after {attempts} attempts: {last_error}")]
pub struct TerminalError {
    /// Total fetch attempts in the episode, initial attempt included.
    pub attempts: u32,
    /// The failure of the final attempt.
    pub last_error: FetchError,
}
