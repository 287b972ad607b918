//! Client for the external POS REST API.
//!
//! # Architecture
//!
//! - The API is the source of truth: customers, products, sales, swaps,
//!   analytics and the audit trail all live there. Nothing is synced
//!   locally.
//! - Every response uses the `{success, data|error}` envelope, unwrapped by
//!   [`sellapp_core::envelope::unwrap_envelope`].
//! - Failures are classified into the closed [`ErrorKind`] set. What the
//!   user sees is decided in exactly one place, [`ApiError::user_message`];
//!   the full detail is logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use sellapp_web::api::{ApiClient, Credentials};
//!
//! let client = ApiClient::new(&config.api)?;
//! let products = client.list_products(&Credentials::anonymous()).await?;
//! ```

mod analytics;
mod catalog;
mod client;
mod customers;
mod pos;
mod swaps;

pub use analytics::EXPORT_TYPES;
pub use client::{ApiClient, Credentials, Download};

use axum::http::StatusCode;
use thiserror::Error;

/// Failure classes for API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, connect, timeout).
    Network,
    /// The response body was empty or not the JSON we expected.
    ParseError,
    /// The API answered with a failure status or `success: false`.
    ApiError,
    /// HTTP 404.
    NotFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Network => "network error",
            Self::ParseError => "parse error",
            Self::ApiError => "api error",
            Self::NotFound => "not found",
        })
    }
}

/// An API call failure.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct ApiError {
    kind: ErrorKind,
    detail: String,
    status: Option<StatusCode>,
}

impl ApiError {
    #[must_use]
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            detail: detail.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn parse(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ParseError,
            detail: detail.into(),
            status: None,
        }
    }

    /// A failure reported by the API. `detail` is shown to the user verbatim.
    #[must_use]
    pub fn api(detail: impl Into<String>, status: Option<StatusCode>) -> Self {
        Self {
            kind: ErrorKind::ApiError,
            detail: detail.into(),
            status,
        }
    }

    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            detail: detail.into(),
            status: Some(StatusCode::NOT_FOUND),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Full technical detail, for logs.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Upstream HTTP status, when there was a response.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Text shown to the user.
    ///
    /// API rejections carry the API's own message (e.g. "Insufficient
    /// stock") so it reaches the user unchanged.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ErrorKind::ParseError => "The server sent an unexpected response.".to_string(),
            ErrorKind::NotFound => "The requested record was not found.".to_string(),
            ErrorKind::ApiError => self.detail.clone(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_per_kind() {
        assert!(ApiError::network("connection refused")
            .user_message()
            .contains("Unable to reach the server"));
        assert_eq!(
            ApiError::api("Insufficient stock", Some(StatusCode::CONFLICT)).user_message(),
            "Insufficient stock"
        );
        assert_eq!(
            ApiError::not_found("/api/customers/9").user_message(),
            "The requested record was not found."
        );
        assert!(!ApiError::parse("expected value at line 1").user_message().contains("line 1"));
    }

    #[test]
    fn test_display_includes_kind_and_detail() {
        let err = ApiError::network("dns failure");
        assert_eq!(err.to_string(), "network error: dns failure");
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.status(), None);
    }
}
