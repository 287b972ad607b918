//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Redirect to the POS
//! GET  /health                         - Liveness
//! GET  /health/ready                   - External API reachable
//!
//! # Pages
//! GET  /dashboard/pos                  - Point of sale
//! GET  /dashboard/pos/swap             - Device swap
//! GET  /pos/receipt/{id}               - Printable receipt
//! GET  /dashboard/customers            - Customer list
//! GET  /dashboard/customers/{id}       - Customer detail and history
//! GET  /dashboard/analytics            - Analytics, profit/loss, alerts
//!
//! # Cart (session)
//! GET  /pos/cart                       - Cart summary
//! POST /pos/cart/add|update|remove|clear
//!
//! # JSON API (envelope)
//! GET  /api/pos/products               - Filtered products and facets
//! GET  /api/pos/quick-stats            - Today's numbers
//! POST /api/pos                        - Complete sale from the cart
//! GET|POST /api/customers              - List / create
//! GET  /api/customers/search           - Sequence-guarded search
//! POST /api/customers/duplicates       - Duplicate phone marks
//! GET|PUT|DELETE /api/customers/{id}
//! GET  /api/customers/{id}/history
//! GET  /api/analytics/charts|alerts|audit-logs|trace|profit-loss
//! GET  /api/analytics/export/{type}    - Report download
//! GET  /api/audit-trail/data
//! GET  /api/brands/by-category/{id}
//! GET  /api/brands/specs/{id}
//! POST /api/swap/balance               - Balance check
//! GET  /api/swap/customers             - Customers for the swap form
//! POST /dashboard/pos/swap/checkout    - Record a balanced swap
//! POST|DELETE /session/token           - Store / clear the bearer token
//! ```

pub mod analytics;
pub mod brands;
pub mod cart;
pub mod customers;
pub mod health;
pub mod pos;
pub mod session;
pub mod swap;

use std::future::Future;

use axum::{
    Json, Router,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::debug;

use sellapp_core::Money;
use sellapp_core::envelope::Envelope;

use crate::api::{ApiError, Credentials};
use crate::error::AppError;
use crate::feeds::{LiveFeed, Snapshot};
use crate::models::{CurrentStaff, session_keys};
use crate::state::AppState;

/// Create the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard/pos") }))
        .merge(health::router())
        .merge(pos::router())
        .merge(cart::router())
        .merge(swap::router())
        .merge(customers::router())
        .merge(analytics::router())
        .merge(brands::router())
        .merge(session::router())
}

/// Wrap a payload in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope::ok(data))
}

/// Values every page template needs.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub staff: Option<CurrentStaff>,
    pub current_path: &'static str,
    pub currency_symbol: String,
    /// Banner shown when the page's data could not be loaded.
    pub error: Option<String>,
}

impl PageContext {
    /// Build the context for a page. Session failures only drop the staff
    /// badge; pages still render.
    pub async fn load(state: &AppState, session: &Session, current_path: &'static str) -> Self {
        let staff = session
            .get::<CurrentStaff>(session_keys::CURRENT_STAFF)
            .await
            .ok()
            .flatten();
        Self {
            staff,
            current_path,
            currency_symbol: state.config().currency_symbol.clone(),
            error: None,
        }
    }

    /// Show an error banner.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    #[must_use]
    pub fn staff_name(&self) -> &str {
        self.staff.as_ref().map_or("", |s| s.name.as_str())
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.staff.as_ref().is_some_and(CurrentStaff::is_manager)
    }

    /// Whether a nav link points at the current page.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        self.current_path.starts_with(prefix)
    }
}

/// Read a query-string passthrough into the shape the API client takes.
pub(crate) fn passthrough(params: &[(String, String)]) -> Vec<(&str, String)> {
    params
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect()
}

/// A money amount accepted as a JSON number or a formatted string.
///
/// Form fields arrive as whatever the input held (`"1,200.50"`, `""`,
/// `450`); anything unparsable is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LenientMoney(pub Money);

impl<'de> Deserialize<'de> for LenientMoney {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(match value {
            Value::Number(n) => Money::parse_lenient(&n.to_string()),
            Value::String(s) => Money::parse_lenient(&s),
            _ => Money::ZERO,
        }))
    }
}

/// Outcome of a sequence-guarded read.
#[derive(Debug)]
pub enum Sequenced<T> {
    /// The newest request for its search box.
    Fresh(T),
    /// A later request was issued while this one was in flight.
    Superseded,
}

impl<T: Serialize> IntoResponse for Sequenced<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Fresh(data) => ok(data).into_response(),
            Self::Superseded => Json(json!({
                "success": true,
                "data": null,
                "superseded": true,
            }))
            .into_response(),
        }
    }
}

/// Client-side ordering of a search request.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchOrder<'a> {
    /// Sequence number the page script gave this request.
    pub seq: Option<u64>,
    /// Id of the page load that sent it.
    pub page: Option<&'a str>,
}

/// Take a ticket for the client's sequence number (or the next one), run
/// `fetch`, and drop the result if a newer request from the same page
/// arrived meanwhile.
pub(crate) async fn sequenced<T, Fut>(
    state: &AppState,
    session: &Session,
    scope: &str,
    order: SearchOrder<'_>,
    fetch: Fut,
) -> Result<Sequenced<T>, AppError>
where
    Fut: Future<Output = Result<T, AppError>>,
{
    let sequence = state
        .search_sequence(session, scope, order.page)
        .await?;
    let ticket = order
        .seq
        .map_or_else(|| sequence.begin(), |seq| sequence.observe(seq));

    let data = fetch.await?;

    if sequence.is_current(ticket) {
        Ok(Sequenced::Fresh(data))
    } else {
        debug!(scope, ticket = ticket.value(), "Dropping superseded response");
        Ok(Sequenced::Superseded)
    }
}

/// Serve a live feed's snapshot to a caller holding a user token, or fetch
/// directly with the caller's own credentials.
///
/// Feeds refresh with the service token, so anonymous callers never see a
/// snapshot; their request goes upstream without a token instead.
pub(crate) async fn feed_or_fetch<T, Fut>(
    feed: &LiveFeed<T>,
    credentials: &Credentials,
    fetch: impl FnOnce() -> Fut,
) -> Result<Snapshot<T>, ApiError>
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>>,
{
    if let Some(snapshot) = feed.latest().filter(|_| !credentials.is_anonymous()) {
        return Ok((*snapshot).clone());
    }
    fetch().await.map(|data| Snapshot {
        data,
        refreshed_at: Utc::now(),
    })
}
