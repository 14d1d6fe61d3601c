use std::time::Duration;

use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, Request};
use serde::de::DeserializeOwned;

use crate::errors::{ConfigError, FetchError};
use crate::request::{RequestInit, RequestTarget};
use crate::result::QueryResult;

/// Builder for constructing a [`Fetcher`] with custom configuration.
///
/// No timeout is set unless you ask for one.
///
/// # Example
///
/// ```no_run
/// use typed_fetch::FetcherBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), typed_fetch::ConfigError> {
/// let fetcher = FetcherBuilder::new()
///     .user_agent("todo-viewer/0.1")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FetcherBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: HeaderMap,
}

impl FetcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time allowed for each request, from connect to end of body.
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = Some(d);
        self
    }

    /// Time allowed for the connect phase only.
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = Some(d);
        self
    }

    /// Set the `User-Agent` header sent with every request.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Add a header sent with every request. Per-request headers in
    /// [`RequestInit`] take precedence.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Build the [`Fetcher`].
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the user agent is not a valid
    /// header value, or [`ConfigError::Http`] if the HTTP client cannot be
    /// initialized.
    pub fn build(self) -> Result<Fetcher, ConfigError> {
        let mut headers = self.default_headers;
        if let Some(ua) = self.user_agent {
            let value = HeaderValue::from_str(&ua).map_err(|source| ConfigError::InvalidHeader {
                name: "user-agent",
                source,
            })?;
            headers.insert(USER_AGENT, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(d) = self.timeout {
            builder = builder.timeout(d);
        }
        if let Some(d) = self.connect_timeout {
            builder = builder.connect_timeout(d);
        }

        Ok(Fetcher {
            http: builder.build()?,
        })
    }
}

/// Performs requests that always resolve to a [`QueryResult`].
///
/// Cloning is cheap and clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use typed_fetch::{Fetcher, FetchError, QueryResult};
///
/// # async fn example() {
/// let fetcher = Fetcher::new();
/// match fetcher.fetch::<serde_json::Value>("https://example.com/todos/1", None).await {
///     QueryResult::Success { result } => println!("{result}"),
///     QueryResult::Error { error: FetchError::Status { code, .. } } => println!("HTTP {code}"),
///     QueryResult::Error { error } => println!("{error}"),
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher with default settings.
    ///
    /// For customization, use [`FetcherBuilder`] instead.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Perform exactly one request and classify its outcome.
    ///
    /// - A transport failure (including a URL that does not parse, or a body
    ///   that breaks off mid-read) becomes [`FetchError::Network`].
    /// - A non-2xx status becomes [`FetchError::Status`]; the body is not read.
    /// - A 2xx body that is not valid JSON for `T` becomes
    ///   [`FetchError::Decode`].
    ///
    /// This never panics on network input and has no error channel besides
    /// the returned value.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        target: impl Into<RequestTarget>,
        init: Option<RequestInit>,
    ) -> QueryResult<T> {
        let target = target.into();
        let url = target.url();

        match self.execute(target, init, &url).await {
            Ok(result) => QueryResult::Success { result },
            Err(error) => QueryResult::Error { error },
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        target: RequestTarget,
        init: Option<RequestInit>,
        url: &str,
    ) -> Result<T, FetchError> {
        let mut req = self.build_request(target).map_err(|e| FetchError::network(e, url))?;
        if let Some(init) = init {
            init.apply(&mut req);
        }

        let response = self
            .http
            .execute(req)
            .await
            .map_err(|e| FetchError::network(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                status_text: reason_phrase(&response),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(e, url))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::decode(e, url))
    }

    fn build_request(&self, target: RequestTarget) -> reqwest::Result<Request> {
        match target {
            RequestTarget::Url(url) => self.http.request(Method::GET, url.as_str()).build(),
            RequestTarget::Request(req) => Ok(req),
        }
    }
}

/// The reason phrase the server sent. hyper only records it when it differs
/// from the canonical phrase, so fall back to that.
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch `target` with a default [`Fetcher`] and decode the JSON body as `T`.
///
/// Prefer holding a [`Fetcher`] when making many requests so the connection
/// pool is reused.
pub async fn typed_fetch<T: DeserializeOwned>(
    target: impl Into<RequestTarget>,
    init: Option<RequestInit>,
) -> QueryResult<T> {
    Fetcher::new().fetch(target, init).await
}
