//! Web-layer models.

pub mod session;

pub use session::{CurrentStaff, keys as session_keys};
