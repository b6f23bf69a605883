//! Wire-format records, exactly as the server sends and receives them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A todo item in wire format (camelCase JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDto {
    pub id: Uuid,
    pub title: String,
    pub is_done: bool,
}

/// Body of a create request. No id; the server assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodoDto {
    pub title: String,
    pub is_done: bool,
}
