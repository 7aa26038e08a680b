use std::io::Read;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::body::IncomingBody;
use crate::error::{FetchError, FetchResult};
use crate::header::HeaderMap;

/// A settled HTTP response whose body is still on the host side.
///
/// Status and headers are available immediately. The body is read lazily
/// through [`body_mut()`](Response::body_mut) or the whole-body helpers;
/// each read may pull from the host, and a pull can still fail after the
/// response itself arrived.
///
/// Dropping the response releases the host stream and disarms the request
/// timeout.
#[derive(Debug)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    content_length: u64,
    body: IncomingBody,
}

impl Response {
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: HeaderMap,
        content_length: u64,
        body: IncomingBody,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            content_length,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Size of the materialized body in bytes. Zero means there is no body.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn body_mut(&mut self) -> &mut IncomingBody {
        &mut self.body
    }

    pub fn into_body(self) -> IncomingBody {
        self.body
    }

    /// Fail with [`FetchError::Status`] for 4xx and 5xx responses.
    pub fn raise_for_status(self) -> FetchResult<Self> {
        if (400..600).contains(&self.status) {
            return Err(FetchError::Status {
                status: self.status,
                status_text: self.status_text,
            });
        }
        Ok(self)
    }

    /// Read the remaining body into a single buffer.
    pub fn into_bytes(mut self) -> FetchResult<Bytes> {
        let capacity = usize::try_from(self.content_length).unwrap_or(0);
        let mut collected = Vec::with_capacity(capacity);
        self.body
            .read_to_end(&mut collected)
            .map_err(unwrap_io_error)?;
        Ok(Bytes::from(collected))
    }

    /// Read the remaining body as text, replacing invalid UTF-8.
    pub fn text(self) -> FetchResult<String> {
        let bytes = self.into_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the remaining body and decode it as JSON.
    pub fn json<T: DeserializeOwned>(self) -> FetchResult<T> {
        let bytes = self.into_bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Body reads wrap bridge failures in `io::Error`; hand the original back.
fn unwrap_io_error(err: std::io::Error) -> FetchError {
    match err.downcast::<FetchError>() {
        Ok(fetch) => fetch,
        Err(err) => FetchError::Runtime(err),
    }
}
