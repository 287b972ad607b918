//! POS products, quick stats and sales.

use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use sellapp_core::SaleId;
use sellapp_core::models::{Product, QuickStats, SaleRequest};

use super::client::{extract_list, extract_record};
use super::{ApiClient, ApiError, Credentials};

impl ApiClient {
    /// Products available for sale.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials))]
    pub async fn list_products(&self, credentials: &Credentials) -> Result<Vec<Product>, ApiError> {
        let value = self
            .request_value(Method::GET, "/api/pos/products", &[], None, credentials)
            .await?;
        extract_list(value, "products")
    }

    /// Today's headline numbers for the POS header.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials))]
    pub async fn quick_stats(&self, credentials: &Credentials) -> Result<QuickStats, ApiError> {
        let value = self
            .request_value(Method::GET, "/api/pos/quick-stats", &[], None, credentials)
            .await?;
        extract_record(value, "stats")
    }

    /// Complete a sale. The API decrements stock and records the sale.
    ///
    /// # Errors
    ///
    /// `ApiError` carrying the API's text (e.g. "Insufficient stock") when
    /// the sale is refused.
    #[instrument(skip(self, sale, credentials), fields(lines = sale.items.len(), total = %sale.total))]
    pub async fn complete_sale(
        &self,
        sale: &SaleRequest,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.send_json(Method::POST, "/api/pos", sale, credentials)
            .await
    }

    /// Receipt data for one sale.
    ///
    /// # Errors
    ///
    /// `NotFound` if the sale does not exist.
    #[instrument(skip(self, credentials), fields(sale_id = %id))]
    pub async fn get_sale(&self, id: SaleId, credentials: &Credentials) -> Result<Value, ApiError> {
        let value = self
            .request_value(Method::GET, &format!("/api/pos/sales/{id}"), &[], None, credentials)
            .await?;
        extract_record(value, "sale")
    }
}
