use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request, Url};
use serde::Serialize;

/// What to fetch: a URL string or a fully built [`reqwest::Request`].
#[derive(Debug)]
pub enum RequestTarget {
    Url(String),
    Request(Request),
}

impl RequestTarget {
    /// The URL reported on errors. A string target is returned verbatim,
    /// even when it does not parse.
    pub fn url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Request(req) => req.url().to_string(),
        }
    }
}

impl From<&str> for RequestTarget {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&String> for RequestTarget {
    fn from(url: &String) -> Self {
        Self::Url(url.clone())
    }
}

impl From<Url> for RequestTarget {
    fn from(url: Url) -> Self {
        Self::Url(url.into())
    }
}

impl From<Request> for RequestTarget {
    fn from(req: Request) -> Self {
        Self::Request(req)
    }
}

/// Per-request options passed through to the HTTP client unchanged.
///
/// # Example
///
/// ```
/// use typed_fetch::{RequestInit, Todo};
/// use reqwest::Method;
///
/// # fn example() -> Result<(), serde_json::Error> {
/// let todo = Todo { id: 201, user_id: Some(1), title: "buy milk".into(), completed: false };
/// let init = RequestInit::new().method(Method::POST).json(&todo)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    method: Option<Method>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set one header, replacing any earlier value with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and mark it as JSON.
    ///
    /// Fails only if `value` cannot be represented as JSON, for example a map
    /// with non-string keys.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Abort the request if it has not completed within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overlay these options onto an already built request.
    pub(crate) fn apply(self, req: &mut Request) {
        if let Some(method) = self.method {
            *req.method_mut() = method;
        }
        for (name, value) in self.headers.iter() {
            req.headers_mut().insert(name.clone(), value.clone());
        }
        if let Some(body) = self.body {
            *req.body_mut() = Some(body.into());
        }
        if let Some(timeout) = self.timeout {
            *req.timeout_mut() = Some(timeout);
        }
    }
}
