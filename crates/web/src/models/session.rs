//! Types stored in the server session.

use serde::{Deserialize, Serialize};

use sellapp_core::StaffId;

/// Staff identity shown in the page header.
///
/// Supplied by the page script together with the bearer token; the API
/// remains the authority on what the staff member may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStaff {
    #[serde(default)]
    pub id: Option<StaffId>,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl CurrentStaff {
    /// Whether the staff member sees manager-only dashboards.
    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| matches!(r.to_ascii_lowercase().as_str(), "manager" | "admin" | "owner"))
    }
}

/// Session keys.
pub mod keys {
    /// The POS cart.
    pub const CART: &str = "cart";

    /// Bearer token for the POS API.
    pub const API_TOKEN: &str = "api_token";

    /// The signed-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";

    /// Random key identifying this session's search sequences.
    pub const SEARCH_KEY: &str = "search_key";
}
