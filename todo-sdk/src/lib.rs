//! # todo-sdk
//!
//! Client SDK for a remote todo HTTP API: one-shot CRUD calls plus a
//! settings-driven polling loop that keeps a shared, replayed stream of the
//! latest todo list.
//!
//! The facade in this crate wires the workspace together: the HTTP client
//! (`todo-client`), the polling controller (`todo-stream`), and the settings
//! handle feeding it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use todo_sdk::{PollSettings, TodoService};
//!
//! let service = TodoService::connect("http://localhost:3333/api", || {
//!     eprintln!("polling gave up, consider reloading");
//! })?;
//!
//! service.settings().apply(PollSettings::enabled(Duration::from_secs(5)));
//!
//! let mut todos = service.todos();
//! while let Some(update) = todos.recv().await {
//!     println!("{} todos", update?.len());
//! }
//! ```

mod error;
mod service;
mod settings_handle;
mod source;

pub use error::{Result, SdkError};
pub use service::TodoService;
pub use settings_handle::SettingsHandle;
pub use source::ClientSource;

// The SDK surface re-exports the types callers interact with.
pub use replay_channel::Subscriber;
pub use todo_api::{NewTodo, Todo};
pub use todo_client::{ClientError, TodoClient};
pub use todo_stream::{
    FetchError, PollSettings, PollerConfig, PollerState, TerminalError, TodoPoller, TodoSubscriber,
};
