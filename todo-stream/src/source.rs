//! The fetch collaborator consumed by the polling controller.

use async_trait::async_trait;

use todo_api::Todo;

use crate::error::FetchError;

/// Asynchronous source of the full todo list.
///
/// The controller calls this once per tick (and once per retry). An
/// implementation over the real HTTP client lives in the `todo-sdk` facade;
/// tests substitute scripted fakes.
#[async_trait]
pub trait TodoSource: Send + Sync {
    /// Fetch the complete current list of todos.
    async fn fetch_all(&self) -> Result<Vec<Todo>, FetchError>;
}
