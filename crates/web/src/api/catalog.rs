//! Brand lookups used by the product and swap forms.

use serde_json::Value;
use tracing::instrument;

use sellapp_core::{BrandId, CategoryId};

use super::{ApiClient, ApiError, Credentials};

impl ApiClient {
    /// Brands sold in a category.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials), fields(category_id = %category))]
    pub async fn brands_by_category(
        &self,
        category: CategoryId,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.get(&format!("/api/brands/by-category/{category}"), &[], credentials)
            .await
    }

    /// Spec fields for a brand's products.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials), fields(brand_id = %brand))]
    pub async fn brand_specs(
        &self,
        brand: BrandId,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.get(&format!("/api/brands/specs/{brand}"), &[], credentials)
            .await
    }
}
