//! Unified error handling for the web application.
//!
//! Every handler error renders as the JSON envelope
//! `{"success": false, "error": "..."}` so the page script can show the
//! message in a toast without special cases.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use sellapp_core::cart::CartError;
use sellapp_core::envelope::Envelope;
use sellapp_core::models::CustomerValidationError;

use crate::api::{ApiError, ErrorKind};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// POS API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart mutation refused.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Form input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CustomerValidationError> for AppError {
    fn from(err: CustomerValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(e) => api_status(e),
            Self::Cart(CartError::InsufficientStock { .. }) => StatusCode::CONFLICT,
            Self::Cart(CartError::NotInCart(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cart(CartError::ZeroQuantity) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Cart(e) => e.to_string(),
            Self::Validation(msg) | Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            // Don't expose internal error details to clients
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    const fn is_server_fault(&self) -> bool {
        match self {
            Self::Api(e) => matches!(e.kind(), ErrorKind::Network | ErrorKind::ParseError),
            Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }
}

fn api_status(err: &ApiError) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Network | ErrorKind::ParseError => StatusCode::BAD_GATEWAY,
        ErrorKind::ApiError => match err.status() {
            Some(status) if status.is_client_error() => status,
            Some(status) if status.is_server_error() => StatusCode::BAD_GATEWAY,
            // 2xx with `success: false`
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Request refused");
        }

        let status = self.status();
        let body = Envelope::<()>::failure(self.user_message());
        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context from the signed-in staff member.
pub fn set_sentry_user(staff_id: Option<&str>, name: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: staff_id.map(String::from),
            username: name.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
