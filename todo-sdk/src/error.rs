//! Error types for the todo-sdk facade.

use todo_client::ClientError;

/// Errors surfaced by the SDK facade.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// An HTTP call against the todo API failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Convenience type alias for Results using SdkError.
pub type Result<T> = std::result::Result<T, SdkError>;
