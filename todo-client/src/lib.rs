//! Minimal async HTTP client for the todo API.
//!
//! This crate owns the transport concern only: it executes one-shot
//! request/response calls against a base endpoint fixed at construction and
//! maps wire records to domain records at the boundary. It performs no
//! retries and keeps no state between calls; polling and retry orchestration
//! live in `todo-stream`.

mod error;

pub use error::{ClientError, Result};

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;
use uuid::Uuid;

use todo_api::{codec, NewTodo, Todo, TodoDto};

/// Async client for the todo API.
///
/// The base endpoint addresses the todo collection itself; individual items
/// live at `{base}/{id}`. The endpoint is configured once at construction
/// and is not reconfigurable at runtime.
///
/// # Example
///
/// ```rust,ignore
/// use todo_client::TodoClient;
///
/// let client = TodoClient::new("http://localhost:3333/api")?;
/// let todos = client.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    base_url: String,
}

impl TodoClient {
    /// Create a new client for the given base endpoint.
    ///
    /// A trailing slash on the base URL is stripped so path construction
    /// stays uniform.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// The configured base endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: Uuid) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Fetch the full todo list.
    pub async fn list(&self) -> Result<Vec<Todo>> {
        let response = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status(response, StatusCode::OK).await?;
        let dtos: Vec<TodoDto> = decode(response).await?;
        Ok(dtos.into_iter().map(codec::deserialize).collect())
    }

    /// Fetch a single todo by id.
    pub async fn get(&self, id: Uuid) -> Result<Todo> {
        let response = self
            .http
            .get(self.item_url(id))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status(response, StatusCode::OK).await?;
        Ok(codec::deserialize(decode(response).await?))
    }

    /// Create a todo from a draft. The server assigns the id.
    pub async fn create(&self, draft: &NewTodo) -> Result<Todo> {
        let response = self
            .http
            .post(&self.base_url)
            .json(&codec::serialize_new(draft))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status(response, StatusCode::CREATED).await?;
        Ok(codec::deserialize(decode(response).await?))
    }

    /// Delete a todo. The server answers with the removed record.
    pub async fn remove(&self, id: Uuid) -> Result<Todo> {
        let response = self
            .http
            .delete(self.item_url(id))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status(response, StatusCode::OK).await?;
        Ok(codec::deserialize(decode(response).await?))
    }

    /// Flip a todo's completion state on the server.
    ///
    /// Sends the record with `is_done` inverted and returns the server's
    /// persisted state, which is authoritative.
    pub async fn complete_or_incomplete(&self, todo: &Todo) -> Result<Todo> {
        let updated = todo.toggled();
        let response = self
            .http
            .put(self.item_url(todo.id))
            .json(&codec::serialize(&updated))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let response = check_status(response, StatusCode::OK).await?;
        Ok(codec::deserialize(decode(response).await?))
    }
}

/// Map non-expected status codes to the appropriate `ClientError` variant.
async fn check_status(response: reqwest::Response, expected: StatusCode) -> Result<reqwest::Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}
