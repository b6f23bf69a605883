//! Adapter from the HTTP client to the polling controller's fetch trait.

use std::sync::Arc;

use async_trait::async_trait;

use todo_api::Todo;
use todo_client::{ClientError, TodoClient};
use todo_stream::{FetchError, TodoSource};

/// `TodoSource` implementation backed by the real HTTP client.
///
/// The controller only distinguishes decode failures from everything else;
/// all other client errors are transport-level from its point of view.
#[derive(Debug, Clone)]
pub struct ClientSource {
    client: Arc<TodoClient>,
}

impl ClientSource {
    pub fn new(client: Arc<TodoClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TodoSource for ClientSource {
    async fn fetch_all(&self) -> Result<Vec<Todo>, FetchError> {
        self.client.list().await.map_err(|err| match err {
            ClientError::Decode(message) => FetchError::Decode(message),
            other => FetchError::Network(other.to_string()),
        })
    }
}
