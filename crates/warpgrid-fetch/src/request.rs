use std::io::{Cursor, Read};
use std::time::Duration;

use bytes::Bytes;

use crate::error::FetchError;
use crate::header::HeaderMap;

/// A finished outgoing request, as handed to
/// [`RequestExecutor::run`](crate::RequestExecutor::run).
///
/// The body is a blocking byte source read lazily while the host sends the
/// request. A request built by a collaborator that already failed carries
/// that failure in [`error`](Request::error); the executor returns it
/// without touching the host.
pub struct Request {
    pub(crate) method: String,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Box<dyn Read + Send>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) error: Option<FetchError>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            error: None,
        }
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Stream the body from `source`. Ignored for GET and HEAD.
    pub fn body(mut self, source: impl Read + Send + 'static) -> Self {
        self.body = Some(Box::new(source));
        self
    }

    /// Send a buffered body. Ignored for GET and HEAD.
    pub fn bytes(self, body: impl Into<Bytes>) -> Self {
        self.body(Cursor::new(body.into()))
    }

    /// Per-request timeout. `Duration::ZERO` disables the timeout even when
    /// the executor has a default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Record a construction failure; `run` will return it as-is.
    pub fn with_error(mut self, error: FetchError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout_setting(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Whether this request's method may carry a body at all.
    pub fn allows_body(&self) -> bool {
        method_allows_body(&self.method)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body.is_some())
            .field("timeout", &self.timeout)
            .field("error", &self.error)
            .finish()
    }
}

/// GET and HEAD never carry a body. The host compares methods
/// case-insensitively for these, so do we.
pub(crate) fn method_allows_body(method: &str) -> bool {
    !(method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD"))
}
