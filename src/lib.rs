//! # typed-fetch
//!
//! HTTP requests that resolve to an exhaustive, typed outcome instead of a
//! mix of `Err` values and panics. Every call returns a [`QueryResult`]:
//! either the decoded body or a [`FetchError`] saying whether the network,
//! the status code, or the payload was at fault.
//!
//! ## Quick start
//!
//! ```no_run
//! use typed_fetch::{typed_fetch, FetchError, QueryResult, Todo};
//!
//! #[tokio::main]
//! async fn main() {
//!     let todo = typed_fetch::<Todo>("https://jsonplaceholder.typicode.com/todos/1", None).await;
//!
//!     match todo {
//!         QueryResult::Success { result } => println!("{}", result.title),
//!         QueryResult::Error { error: FetchError::Network { .. } } => {
//!             println!("network error occurred. try refreshing.")
//!         }
//!         QueryResult::Error { error: FetchError::Status { code, .. } } => {
//!             println!("HTTP error code {code}")
//!         }
//!         QueryResult::Error { error: FetchError::Decode { .. } } => {
//!             println!("unexpected response body")
//!         }
//!     }
//! }
//! ```
//!
//! ## Loading state
//!
//! ```no_run
//! use typed_fetch::{QueryState, TodoApi};
//!
//! # async fn example() {
//! let query = TodoApi::new().query("1");
//! assert!(matches!(query.state(), QueryState::Loading));
//!
//! query.refetch().await;
//! if let QueryState::Success { result } = query.state() {
//!     println!("{}", result.title);
//! }
//! # }
//! ```

mod client;
mod errors;
mod models;
mod query;
mod request;
mod result;
mod todos;

pub use client::{typed_fetch, Fetcher, FetcherBuilder};
pub use errors::{ConfigError, FetchError};
pub use models::Todo;
pub use query::{Query, QueryState};
pub use request::{RequestInit, RequestTarget};
pub use result::QueryResult;
pub use todos::TodoApi;
