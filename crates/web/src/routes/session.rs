//! Bearer token and staff identity held in the server session.
//!
//! Sign-in happens against the POS API; the page script hands the token
//! it received to this application so server-rendered pages and requests
//! without an `Authorization` header can act for the same staff member.

use axum::{Json, Router, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument};

use sellapp_core::envelope::Envelope;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentStaff, session_keys};
use crate::routes::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/session/token", post(store_token).delete(clear_token))
}

/// Body of `POST /session/token`.
#[derive(Deserialize)]
pub struct TokenForm {
    pub token: String,
    #[serde(default)]
    pub staff: Option<CurrentStaff>,
}

impl std::fmt::Debug for TokenForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenForm")
            .field("token", &"[REDACTED]")
            .field("staff", &self.staff)
            .finish()
    }
}

/// Store the bearer token (and optionally the staff identity).
#[instrument(skip(session, form))]
async fn store_token(
    session: Session,
    Json(form): Json<TokenForm>,
) -> Result<Json<Envelope<Value>>, AppError> {
    let token = form.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Token is required".to_string()));
    }

    // New identity, new session ID.
    session.cycle_id().await?;
    session.insert(session_keys::API_TOKEN, token).await?;

    if let Some(staff) = &form.staff {
        session.insert(session_keys::CURRENT_STAFF, staff).await?;
        let id = staff.id.map(|id| id.to_string());
        set_sentry_user(id.as_deref(), Some(&staff.name));
        info!(staff = %staff.name, "Session token stored");
    } else {
        info!("Session token stored");
    }

    Ok(ok(json!({ "stored": true })))
}

/// Forget the token and staff identity. The cart is kept.
#[instrument(skip(session))]
async fn clear_token(session: Session) -> Result<Json<Envelope<Value>>, AppError> {
    session.remove::<String>(session_keys::API_TOKEN).await?;
    session
        .remove::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await?;
    clear_sentry_user();
    info!("Session token cleared");
    Ok(ok(json!({ "stored": false })))
}
