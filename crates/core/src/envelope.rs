//! The `{success, data|error}` response envelope.
//!
//! Every JSON endpoint of the POS API, and every JSON endpoint this
//! application serves, wraps its payload the same way:
//!
//! ```text
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": "Insufficient stock" }
//! ```
//!
//! Some API endpoints put their payload next to `success` instead of under
//! `data` (`{"success": true, "customers": [...]}`); [`unwrap_envelope`]
//! accepts both shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Optional informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// A successful envelope carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// A failed envelope carrying `error`.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

/// Why an envelope could not be unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The API reported `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// The body was JSON `null` or an empty object.
    #[error("empty response")]
    Empty,
}

/// Fallback text when the API reports failure without saying why.
pub const GENERIC_FAILURE: &str = "The request could not be completed";

/// Extract the payload from an API response body.
///
/// - `success: false` becomes [`EnvelopeError::Rejected`] with the `error`
///   (or `message`) text.
/// - A `data` field is returned as-is.
/// - Otherwise the object minus its `success`/`message` keys is returned, or
///   the single remaining value when only one key is left.
/// - Bodies that are not objects (arrays, scalars) are returned unchanged.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the API rejected the request or the body is
/// empty.
pub fn unwrap_envelope(body: Value) -> Result<Value, EnvelopeError> {
    let Value::Object(mut map) = body else {
        return match body {
            Value::Null => Err(EnvelopeError::Empty),
            other => Ok(other),
        };
    };

    if map.is_empty() {
        return Err(EnvelopeError::Empty);
    }

    if map.get("success").and_then(Value::as_bool) == Some(false) {
        let text = ["error", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(error_text))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Err(EnvelopeError::Rejected(text));
    }

    if let Some(data) = map.remove("data") {
        return Ok(data);
    }

    map.remove("success");
    map.remove("message");
    if map.len() == 1 {
        if let Some((_, only)) = map.into_iter().next() {
            return Ok(only);
        }
        return Err(EnvelopeError::Empty);
    }
    Ok(Value::Object(map))
}

/// Pull a readable message out of an `error` field that may be a string or
/// an object such as `{"message": "..."}`.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// Extract an error message from an error response body, if it has one.
///
/// Used for non-2xx responses whose body may or may not be an envelope.
#[must_use]
pub fn error_message(body: &Value) -> Option<String> {
    let map = body.as_object()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| map.get(*key).and_then(error_text))
}
