use serde::Serialize;

use crate::errors::FetchError;

/// The outcome of one completed request: data or an error, never both.
///
/// Serializes with a `status` tag of `"result"` or `"error"`. [`FetchError`]
/// serializes too, so the default error type works out of the box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum QueryResult<T, E = FetchError> {
    #[serde(rename = "result")]
    Success { result: T },
    #[serde(rename = "error")]
    Error { error: E },
}

impl<T, E> QueryResult<T, E> {
    pub fn success(result: T) -> Self {
        Self::Success { result }
    }

    pub fn error(error: E) -> Self {
        Self::Error { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Borrow the data, if this is the success branch.
    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Success { result } => Some(result),
            Self::Error { .. } => None,
        }
    }

    /// Borrow the error, if this is the error branch.
    pub fn err(&self) -> Option<&E> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U, E> {
        match self {
            Self::Success { result } => QueryResult::Success { result: f(result) },
            Self::Error { error } => QueryResult::Error { error },
        }
    }

    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> QueryResult<T, F> {
        match self {
            Self::Success { result } => QueryResult::Success { result },
            Self::Error { error } => QueryResult::Error { error: f(error) },
        }
    }

    /// Convert into a standard `Result` so `?` can be used at the call site.
    pub fn into_result(self) -> Result<T, E> {
        self.into()
    }
}

impl<T, E> From<QueryResult<T, E>> for Result<T, E> {
    fn from(value: QueryResult<T, E>) -> Self {
        match value {
            QueryResult::Success { result } => Ok(result),
            QueryResult::Error { error } => Err(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for QueryResult<T, E> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(result) => Self::Success { result },
            Err(error) => Self::Error { error },
        }
    }
}
