//! Analytics, alerts, audit trail and exports.
//!
//! Chart and trace payloads are handed to the page script untouched, so
//! they stay as `serde_json::Value`.

use reqwest::Method;
use serde_json::Value;
use tracing::instrument;

use sellapp_core::models::{Alert, AuditLogEntry, ProfitLossReport};

use super::client::{Download, extract_list, extract_record};
use super::{ApiClient, ApiError, Credentials};

/// Export formats the API can generate.
pub const EXPORT_TYPES: &[&str] = &["pdf", "csv", "excel", "xlsx"];

impl ApiClient {
    /// Chart series for the analytics dashboard.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, query, credentials))]
    pub async fn analytics_charts(
        &self,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.get("/api/analytics/charts", query, credentials).await
    }

    /// Active alerts.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, credentials))]
    pub async fn analytics_alerts(&self, credentials: &Credentials) -> Result<Vec<Alert>, ApiError> {
        let value = self
            .request_value(Method::GET, "/api/analytics/alerts", &[], None, credentials)
            .await?;
        extract_list(value, "alerts")
    }

    /// Recent audit log entries.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, query, credentials))]
    pub async fn analytics_audit_logs(
        &self,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<Vec<AuditLogEntry>, ApiError> {
        let value = self
            .request_value(Method::GET, "/api/analytics/audit-logs", query, None, credentials)
            .await?;
        extract_list(value, "logs")
    }

    /// Trace of one transaction across sales, stock and audit records.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, query, credentials))]
    pub async fn analytics_trace(
        &self,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.get("/api/analytics/trace", query, credentials).await
    }

    /// Daily, weekly and monthly profit/loss aggregates.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, query, credentials))]
    pub async fn profit_loss(
        &self,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<ProfitLossReport, ApiError> {
        let value = self
            .request_value(Method::GET, "/api/analytics/profit-loss", query, None, credentials)
            .await?;
        extract_record(value, "report")
    }

    /// Filtered audit trail for the manager view.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, query, credentials))]
    pub async fn audit_trail(
        &self,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        self.get("/api/audit-trail/data", query, credentials).await
    }

    /// Generated report file.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    #[instrument(skip(self, query, credentials))]
    pub async fn analytics_export(
        &self,
        export_type: &str,
        query: &[(&str, String)],
        credentials: &Credentials,
    ) -> Result<Download, ApiError> {
        self.download(&format!("/api/analytics/export/{export_type}"), query, credentials)
            .await
    }
}
