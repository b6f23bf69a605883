//! Error types for the todo-client crate.

/// Errors from one-shot HTTP calls against the todo API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The base URL handed to the constructor does not parse
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request could not be sent or the response not read
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered 404 for the addressed todo
    #[error("Todo not found")]
    NotFound,

    /// The server answered with an unexpected status code
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// The response body did not decode as the expected wire record
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Convenience type alias for Results using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;
