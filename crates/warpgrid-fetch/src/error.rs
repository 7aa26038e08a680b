//! Error types for the fetch bridge.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors returned by [`RequestExecutor::run`](crate::RequestExecutor::run)
/// and the response helpers.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request failed to build before it reached the executor.
    #[error("{0}")]
    Request(String),

    /// The host networking primitive rejected the call. Timeouts land here
    /// too: an aborted fetch is just another rejection.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// A settled response could not materialize its body.
    #[error("response body unavailable: {0}")]
    Body(Rejection),

    /// Returned by [`Response::raise_for_status`](crate::Response::raise_for_status).
    #[error("http status {status}: {status_text}")]
    Status { status: u16, status_text: String },

    #[error("host runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
}

/// A host rejection reduced to its human-readable message.
///
/// Host rejection payloads have no guaranteed shape, so
/// [`Rejection::from_payload`] walks a fixed fallback chain: the payload's
/// `message` field, then the payload coerced to a string, then an empty
/// message when no payload was supplied at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Derive a rejection from a raw host payload.
    pub fn from_payload(payload: Option<&Value>) -> Self {
        match payload {
            None => Self::new(""),
            Some(value) => match value.get("message") {
                Some(message) => Self::new(coerce_to_string(message)),
                None => Self::new(coerce_to_string(value)),
            },
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Rejection {}

impl From<String> for Rejection {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Rejection {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// String coercion with host (`String(value)`) semantics.
pub(crate) fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_message_field_wins() {
        let payload = json!({"name": "TypeError", "message": "Failed to fetch"});
        let rejection = Rejection::from_payload(Some(&payload));
        assert_eq!(rejection.message(), "Failed to fetch");
    }

    #[test]
    fn non_string_message_is_coerced() {
        let payload = json!({"message": 42});
        assert_eq!(Rejection::from_payload(Some(&payload)).message(), "42");
    }

    #[test]
    fn payload_without_message_is_coerced() {
        assert_eq!(
            Rejection::from_payload(Some(&json!("connection reset"))).message(),
            "connection reset"
        );
        assert_eq!(
            Rejection::from_payload(Some(&json!({"code": 7}))).message(),
            "[object Object]"
        );
        assert_eq!(Rejection::from_payload(Some(&json!(null))).message(), "null");
        assert_eq!(Rejection::from_payload(Some(&json!(false))).message(), "false");
    }

    #[test]
    fn array_payload_joins_elements() {
        let payload = json!([1, null, "x", [2, 3]]);
        assert_eq!(Rejection::from_payload(Some(&payload)).message(), "1,,x,2,3");
    }

    #[test]
    fn missing_payload_gives_empty_error() {
        let err = FetchError::from(Rejection::from_payload(None));
        assert_eq!(err.to_string(), "");
        assert!(matches!(err, FetchError::Rejected(_)));
    }

    #[test]
    fn rejected_error_is_transparent() {
        let err = FetchError::from(Rejection::new("The operation was aborted."));
        assert_eq!(err.to_string(), "The operation was aborted.");
    }

    #[test]
    fn body_error_display() {
        let err = FetchError::Body(Rejection::new("blob read failed"));
        assert_eq!(err.to_string(), "response body unavailable: blob read failed");
    }

    #[test]
    fn status_error_display() {
        let err = FetchError::Status {
            status: 404,
            status_text: "Not Found".into(),
        };
        assert_eq!(err.to_string(), "http status 404: Not Found");
    }
}
