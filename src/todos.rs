use crate::client::Fetcher;
use crate::models::Todo;
use crate::query::Query;
use crate::result::QueryResult;

const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/todos";
const BASE_URL_ENV: &str = "TODOS_BASE_URL";

/// Loads todos from a JSON placeholder style `/todos/:id` endpoint.
///
/// # Example
///
/// ```no_run
/// use typed_fetch::{QueryResult, TodoApi};
///
/// # async fn example() {
/// let api = TodoApi::from_env();
/// if let QueryResult::Success { result } = api.load_todo("1").await {
///     println!("{}", result.title);
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TodoApi {
    fetcher: Fetcher,
    base_url: String,
}

impl TodoApi {
    /// Use the public placeholder service with a default [`Fetcher`].
    pub fn new() -> Self {
        Self {
            fetcher: Fetcher::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the base URL from `TODOS_BASE_URL`, falling back to the public
    /// placeholder service.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new().with_base_url(url),
            _ => Self::new(),
        }
    }

    /// Override the base URL (defaults to `https://jsonplaceholder.typicode.com/todos`).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a single todo by id.
    pub async fn load_todo(&self, id: &str) -> QueryResult<Todo> {
        let url = format!("{}/{id}", self.base_url);
        tracing::debug!(%url, "loading todo");
        self.fetcher.fetch(url, None).await
    }

    /// A query tracking one todo id. Call [`Query::set_key`] to follow a
    /// different todo.
    pub fn query(&self, id: impl Into<String>) -> Query<String, Todo> {
        let api = self.clone();
        Query::new(id.into(), move |id: String| {
            let api = api.clone();
            async move { api.load_todo(&id).await }
        })
    }
}

impl Default for TodoApi {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let api = TodoApi::new().with_base_url(" http://localhost:8080/todos/ ");
        assert_eq!(api.base_url(), "http://localhost:8080/todos");
    }

    #[test]
    fn defaults_to_placeholder_service() {
        assert_eq!(TodoApi::default().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn query_starts_loading_with_given_id() {
        let query = TodoApi::new().query("7");
        assert_eq!(query.key(), "7");
        assert!(query.state().is_loading());
    }
}
