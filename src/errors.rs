use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Why a typed fetch did not produce data.
///
/// Returned as a value inside [`QueryResult::Error`](crate::QueryResult::Error),
/// never as a Rust `Err` from the fetch itself. Every branch carries the
/// literal request URL.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The request never produced a response: connection refused, DNS
    /// failure, timeout, malformed URL, or the body stream broke off.
    #[error("network error requesting {url}: {source}")]
    Network {
        #[source]
        source: Arc<reqwest::Error>,
        url: String,
    },

    /// The server answered with a status outside the 2xx range.
    #[error("HTTP {code} {status_text} from {url}")]
    Status {
        code: u16,
        status_text: String,
        url: String,
    },

    /// The server answered 2xx but the body did not deserialize into the
    /// expected type.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        #[source]
        source: Arc<serde_json::Error>,
        url: String,
    },
}

impl FetchError {
    pub(crate) fn network(source: reqwest::Error, url: impl Into<String>) -> Self {
        Self::Network {
            source: Arc::new(source),
            url: url.into(),
        }
    }

    pub(crate) fn decode(source: serde_json::Error, url: impl Into<String>) -> Self {
        Self::Decode {
            source: Arc::new(source),
            url: url.into(),
        }
    }

    /// Stable tag for the branch: `"network-error"`, `"status-error"` or
    /// `"decode-error"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network-error",
            Self::Status { .. } => "status-error",
            Self::Decode { .. } => "decode-error",
        }
    }

    /// The URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => url,
        }
    }

    /// HTTP status code, only for [`FetchError::Status`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Network { .. } | Self::Decode { .. } => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Serializes as a flat object tagged by `kind`. Underlying errors are
/// rendered as a `message` string.
impl Serialize for FetchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.kind())?;
        match self {
            Self::Network { source, url } => {
                map.serialize_entry("message", &source.to_string())?;
                map.serialize_entry("url", url)?;
            }
            Self::Status {
                code,
                status_text,
                url,
            } => {
                map.serialize_entry("code", code)?;
                map.serialize_entry("statusText", status_text)?;
                map.serialize_entry("url", url)?;
            }
            Self::Decode { source, url } => {
                map.serialize_entry("message", &source.to_string())?;
                map.serialize_entry("url", url)?;
            }
        }
        map.end()
    }
}

/// Errors raised while configuring a [`Fetcher`](crate::Fetcher).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The underlying reqwest client could not be built (TLS backend init).
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// A header value passed to the builder is not valid HTTP.
    #[error("invalid value for header {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
}
