//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (record `x-request-id` in span, Sentry scope, response)
//! 4. Session layer (tower-sessions, in-memory store)
//!
//! Handlers pick up their API credentials through [`ApiCredentials`].

pub mod credentials;
pub mod request_id;
pub mod session;

pub use credentials::ApiCredentials;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
