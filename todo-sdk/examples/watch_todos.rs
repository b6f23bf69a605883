//! Minimal consumer: enable polling and print every refreshed list.
//!
//! Expects a todo API at http://localhost:3333/api. Run with:
//!
//! ```sh
//! cargo run --example watch_todos
//! ```

use std::time::Duration;

use todo_sdk::{PollSettings, TodoService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_stream=debug,todo_sdk=debug".into()),
        )
        .init();

    let service = TodoService::connect("http://localhost:3333/api", || {
        eprintln!("polling gave up; restart the watcher to resume");
    })?;

    service
        .settings()
        .apply(PollSettings::enabled(Duration::from_secs(5)));

    let mut todos = service.todos();
    while let Some(update) = todos.recv().await {
        match update {
            Ok(list) => {
                println!("-- {} todos --", list.len());
                for todo in &list {
                    let mark = if todo.is_done { "x" } else { " " };
                    println!("[{}] {}", mark, todo.title);
                }
            }
            Err(error) => {
                eprintln!("stream ended: {error}");
                break;
            }
        }
    }

    Ok(())
}
