//! Analytics, alert and audit records aggregated by the POS API.

use serde::{Deserialize, Serialize};

use super::Extra;
use crate::types::Money;

/// One row of a daily/weekly/monthly aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    /// Period start; format varies by granularity and may be missing.
    #[serde(default, alias = "period")]
    pub date: Option<String>,
    #[serde(default)]
    pub sales_count: u64,
    #[serde(default)]
    pub revenue: Money,
    #[serde(default)]
    pub profit: Money,
}

/// Where revenue came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueSource {
    Sales,
    Repairs,
    Swaps,
}

impl RevenueSource {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Repairs => "Repairs",
            Self::Swaps => "Swaps",
        }
    }
}

/// Totals for a single revenue source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTotals {
    pub source: RevenueSource,
    #[serde(default)]
    pub revenue: Money,
    #[serde(default)]
    pub cost: Money,
    #[serde(default)]
    pub profit: Money,
}

/// Response of `GET /api/analytics/profit-loss`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossReport {
    #[serde(default)]
    pub daily: Vec<PeriodAggregate>,
    #[serde(default)]
    pub weekly: Vec<PeriodAggregate>,
    #[serde(default)]
    pub monthly: Vec<PeriodAggregate>,
    #[serde(default)]
    pub sources: Vec<SourceTotals>,
}

/// Response of `GET /api/pos/quick-stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    #[serde(default, alias = "today_sales")]
    pub today_sales_count: u64,
    #[serde(default)]
    pub today_revenue: Money,
    #[serde(default)]
    pub low_stock_count: u64,
    #[serde(default)]
    pub pending_repairs: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One entry of `GET /api/analytics/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default = "default_alert_level", alias = "severity")]
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_alert_level() -> String {
    "info".to_string()
}

/// One entry of `GET /api/analytics/audit-logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(alias = "event", alias = "event_type")]
    pub action: String,
    #[serde(default, alias = "user", alias = "staff_name")]
    pub actor: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}
