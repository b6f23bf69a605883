//! Mapping between wire and domain records.
//!
//! Pure field mapping, no I/O and no failure modes. Kept as free functions
//! so the boundary where wire types become domain types stays easy to spot.

use crate::types::{NewTodo, Todo};
use crate::wire::{NewTodoDto, TodoDto};

/// Convert a wire record into a domain record.
pub fn deserialize(dto: TodoDto) -> Todo {
    Todo {
        id: dto.id,
        title: dto.title,
        is_done: dto.is_done,
    }
}

/// Convert a domain record into a wire record.
pub fn serialize(todo: &Todo) -> TodoDto {
    TodoDto {
        id: todo.id,
        title: todo.title.clone(),
        is_done: todo.is_done,
    }
}

/// Convert a draft into the wire body of a create request.
pub fn serialize_new(draft: &NewTodo) -> NewTodoDto {
    NewTodoDto {
        title: draft.title.clone(),
        is_done: draft.is_done,
    }
}
