//! Device swap transactions.

use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use sellapp_core::models::SwapRequest;

use super::{ApiClient, ApiError, Credentials};

impl ApiClient {
    /// Record a balanced swap.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(
        skip(self, swap, credentials),
        fields(customer_id = %swap.customer_id, product_id = %swap.company_product_id)
    )]
    pub async fn create_swap(
        &self,
        swap: &SwapRequest,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.send_json(Method::POST, "/api/swaps", swap, credentials)
            .await
    }
}
