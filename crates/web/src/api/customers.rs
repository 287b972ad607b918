//! Customer record operations.

use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use sellapp_core::CustomerId;
use sellapp_core::models::{Customer, CustomerInput};

use super::client::{extract_list, extract_record};
use super::{ApiClient, ApiError, Credentials};

impl ApiClient {
    /// List every customer.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials))]
    pub async fn list_customers(&self, credentials: &Credentials) -> Result<Vec<Customer>, ApiError> {
        let value = self
            .request_value(Method::GET, "/api/customers", &[], None, credentials)
            .await?;
        extract_list(value, "customers")
    }

    /// Get one customer.
    ///
    /// # Errors
    ///
    /// `NotFound` if the customer does not exist.
    #[instrument(skip(self, credentials), fields(customer_id = %id))]
    pub async fn get_customer(
        &self,
        id: CustomerId,
        credentials: &Credentials,
    ) -> Result<Customer, ApiError> {
        let value = self
            .request_value(Method::GET, &format!("/api/customers/{id}"), &[], None, credentials)
            .await?;
        extract_record(value, "customer")
    }

    /// Purchase and repair history for one customer, passed through as-is.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials), fields(customer_id = %id))]
    pub async fn customer_history(
        &self,
        id: CustomerId,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.get(&format!("/api/customers/{id}/history"), &[], credentials)
            .await
    }

    /// Search customers by name, phone or email.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials))]
    pub async fn search_customers(
        &self,
        query: &str,
        credentials: &Credentials,
    ) -> Result<Vec<Customer>, ApiError> {
        let value = self
            .request_value(
                Method::GET,
                "/api/customers/search",
                &[("q", query.to_string())],
                None,
                credentials,
            )
            .await?;
        extract_list(value, "customers")
    }

    /// Create a customer from validated input.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, input, credentials))]
    pub async fn create_customer(
        &self,
        input: &CustomerInput,
        credentials: &Credentials,
    ) -> Result<Customer, ApiError> {
        let value: Value = self
            .send_json(Method::POST, "/api/customers", input, credentials)
            .await?;
        extract_record(value, "customer")
    }

    /// Replace a customer's editable fields.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, input, credentials), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        input: &CustomerInput,
        credentials: &Credentials,
    ) -> Result<Customer, ApiError> {
        let value: Value = self
            .send_json(Method::PUT, &format!("/api/customers/{id}"), input, credentials)
            .await?;
        extract_record(value, "customer")
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials), fields(customer_id = %id))]
    pub async fn delete_customer(
        &self,
        id: CustomerId,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        self.request_value(
            Method::DELETE,
            &format!("/api/customers/{id}"),
            &[],
            None,
            credentials,
        )
        .await
        .map(|_| ())
    }
}
