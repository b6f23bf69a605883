//! Domain records for todo items.

use uuid::Uuid;

/// A todo item as domain code sees it.
///
/// Delivered by list/fetch operations and returned by mutations; the caller
/// owns the record once delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Server-assigned identifier.
    pub id: Uuid,
    /// Human-readable title.
    pub title: String,
    /// Whether the item has been completed.
    pub is_done: bool,
}

impl Todo {
    /// A copy of this todo with the completion flag flipped.
    ///
    /// Used by the complete/incomplete toggle: the flipped record is sent to
    /// the server, and the server's persisted state is what comes back.
    pub fn toggled(&self) -> Todo {
        Todo {
            id: self.id,
            title: self.title.clone(),
            is_done: !self.is_done,
        }
    }
}

/// A draft todo for creation. The server assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    /// Human-readable title.
    pub title: String,
    /// Initial completion state, almost always `false`.
    pub is_done: bool,
}

impl NewTodo {
    /// Create a draft with the given title, not yet done.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_done: false,
        }
    }
}
