//! # todo-api
//!
//! Domain and wire types for the todo HTTP API.
//!
//! The API speaks camelCase JSON; domain code uses snake_case Rust records.
//! The two never mix: HTTP-facing code works with [`TodoDto`] /
//! [`NewTodoDto`] and converts at the boundary through the [`codec`] module.
//! This crate performs no I/O.

pub mod codec;
mod types;
mod wire;

pub use types::{NewTodo, Todo};
pub use wire::{NewTodoDto, TodoDto};
