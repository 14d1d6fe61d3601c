//! Render the loading/result/error states of one todo as text.
//!
//! Run with:
//!   cargo run --example todo -- 1
//!
//! Set `TODOS_BASE_URL` to point at another server and `RUST_LOG=typed_fetch=debug`
//! to see query transitions.

use tracing_subscriber::EnvFilter;
use typed_fetch::{FetchError, QueryState, Todo, TodoApi};

fn render(state: &QueryState<Todo>) -> String {
    match state {
        QueryState::Loading => "Loading".to_string(),
        QueryState::Error {
            error: FetchError::Network { .. },
        } => "network error occurred. try refreshing.".to_string(),
        QueryState::Error {
            error: FetchError::Status { code, .. },
        } => format!("HTTP error code {code}"),
        QueryState::Error {
            error: FetchError::Decode { .. },
        } => "the server sent a todo we could not read.".to_string(),
        QueryState::Success { result } => result.title.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<(), tokio::task::JoinError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let id = std::env::args().nth(1).unwrap_or_else(|| "1".to_string());

    // -----------------------------------------------------------------------
    // 1. Mount: the query is Loading before anything goes over the wire
    // -----------------------------------------------------------------------
    let query = TodoApi::from_env().query(id);
    let mut states = query.subscribe();
    println!("{}", render(&states.borrow_and_update()));

    // -----------------------------------------------------------------------
    // 2. Initial fetch, printing every transition
    // -----------------------------------------------------------------------
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            println!("{}", render(&states.borrow_and_update()));
        }
    });

    query.refetch().await;

    // -----------------------------------------------------------------------
    // 3. Retry once on error, the way a "try again" button would
    // -----------------------------------------------------------------------
    if query.state().err().is_some() {
        query.refetch().await;
    }

    // -----------------------------------------------------------------------
    // 4. Follow a different todo
    // -----------------------------------------------------------------------
    query.set_key("2".to_string()).await;

    // Dropping the query closes the state channel and ends the printer.
    drop(query);
    printer.await?;

    Ok(())
}
