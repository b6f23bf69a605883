//! The SDK facade.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use todo_api::{NewTodo, Todo};
use todo_client::TodoClient;
use todo_stream::{PollSettings, PollerConfig, TodoPoller, TodoSubscriber};

use crate::error::Result;
use crate::settings_handle::SettingsHandle;
use crate::source::ClientSource;

/// Client SDK for a remote todo API.
///
/// Owns the HTTP client, the settings stream, and the background polling
/// controller. CRUD calls pass straight through to the HTTP client with no
/// retry; the refresh loop is driven entirely by the published settings.
///
/// Must be constructed inside a tokio runtime (the polling controller is
/// spawned on construction).
pub struct TodoService {
    client: Arc<TodoClient>,
    settings: SettingsHandle,
    poller: TodoPoller,
}

impl TodoService {
    /// Connect to the API at `base_url` with default settings (polling
    /// disabled) and the default retry policy.
    ///
    /// `recovery` is invoked once per exhausted failure episode of the
    /// polling loop, e.g. to offer the user a full reload.
    pub fn connect(base_url: &str, recovery: impl Fn() + Send + Sync + 'static) -> Result<Self> {
        Self::with_config(
            base_url,
            recovery,
            PollSettings::default(),
            PollerConfig::default(),
        )
    }

    /// Connect with explicit initial settings and retry policy.
    pub fn with_config(
        base_url: &str,
        recovery: impl Fn() + Send + Sync + 'static,
        initial_settings: PollSettings,
        poller_config: PollerConfig,
    ) -> Result<Self> {
        let client = Arc::new(TodoClient::new(base_url)?);
        let (settings_tx, settings_rx) = watch::channel(initial_settings);

        let source = Arc::new(ClientSource::new(Arc::clone(&client)));
        let poller = TodoPoller::with_config(
            source,
            settings_rx,
            Arc::new(recovery),
            poller_config,
        );

        tracing::debug!(base_url, "Todo service connected");

        Ok(Self {
            client,
            settings: SettingsHandle::new(settings_tx),
            poller,
        })
    }

    /// Subscribe to the shared stream of fetched todo lists.
    ///
    /// Every subscriber shares the single polling cycle; a subscriber
    /// attaching after a successful fetch immediately receives the most
    /// recent list.
    pub fn todos(&self) -> TodoSubscriber {
        self.poller.subscribe()
    }

    /// The most recently fetched list, if any.
    pub fn latest(&self) -> Option<Vec<Todo>> {
        self.poller.latest()
    }

    /// Handle for changing polling settings.
    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// The underlying polling controller, for state introspection.
    pub fn poller(&self) -> &TodoPoller {
        &self.poller
    }

    /// Fetch the full todo list once, outside the polling loop.
    pub async fn list(&self) -> Result<Vec<Todo>> {
        Ok(self.client.list().await?)
    }

    /// Fetch a single todo by id.
    pub async fn get(&self, id: Uuid) -> Result<Todo> {
        Ok(self.client.get(id).await?)
    }

    /// Create a todo from a draft.
    pub async fn create(&self, draft: &NewTodo) -> Result<Todo> {
        Ok(self.client.create(draft).await?)
    }

    /// Delete a todo, returning the removed record.
    pub async fn remove(&self, id: Uuid) -> Result<Todo> {
        Ok(self.client.remove(id).await?)
    }

    /// Flip a todo's completion state on the server and return the
    /// persisted record.
    pub async fn complete_or_incomplete(&self, todo: &Todo) -> Result<Todo> {
        Ok(self.client.complete_or_incomplete(todo).await?)
    }

    /// Stop the polling controller and wait for it to finish.
    pub async fn shutdown(self) {
        let Self { poller, .. } = self;
        poller.shutdown().await;
    }
}

impl std::fmt::Debug for TodoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoService")
            .field("base_url", &self.client.base_url())
            .field("settings", &self.settings.current())
            .field("poller", &self.poller)
            .finish()
    }
}
