//! Analytics dashboard, profit/loss, alerts, audit trail and exports.
//!
//! Charts, quick stats, alerts and audit logs are served from the live
//! feeds when the request carries no filters; filtered requests go
//! straight to the API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::{instrument, warn};

use sellapp_core::envelope::Envelope;
use sellapp_core::models::{Alert, AuditLogEntry, ProfitLossReport};
use sellapp_core::profit_loss::{BreakdownTable, Granularity, ProfitLossSummary, build_table};

use crate::api::EXPORT_TYPES;
use crate::error::AppError;
use crate::feeds::Snapshot;
use crate::filters;
use crate::middleware::ApiCredentials;
use crate::routes::pos::QuickStatsView;
use crate::routes::{PageContext, feed_or_fetch, ok, passthrough};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/analytics", get(analytics_page))
        .route("/api/analytics/charts", get(charts))
        .route("/api/analytics/alerts", get(alerts))
        .route("/api/analytics/audit-logs", get(audit_logs))
        .route("/api/analytics/trace", get(trace))
        .route("/api/analytics/profit-loss", get(profit_loss))
        .route("/api/analytics/export/{export_type}", get(export))
        .route("/api/audit-trail/data", get(audit_trail))
}

type Params = Query<Vec<(String, String)>>;

/// The three breakdown tables and the overall summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitLossView {
    pub daily: BreakdownTable,
    pub weekly: BreakdownTable,
    pub monthly: BreakdownTable,
    pub summary: ProfitLossSummary,
}

impl ProfitLossView {
    /// Format a report, logging any period dates that had to fall back to
    /// today.
    #[must_use]
    pub fn from_report(report: &ProfitLossReport) -> Self {
        let today = Utc::now().date_naive();
        let view = Self {
            daily: build_table(Granularity::Daily, &report.daily, today),
            weekly: build_table(Granularity::Weekly, &report.weekly, today),
            monthly: build_table(Granularity::Monthly, &report.monthly, today),
            summary: ProfitLossSummary::from_sources(&report.sources),
        };
        for table in view.tables() {
            if !table.fallback_dates.is_empty() {
                warn!(
                    granularity = table.granularity.title(),
                    dates = ?table.fallback_dates,
                    "Unparsable period dates labelled with today"
                );
            }
        }
        view
    }

    #[must_use]
    pub fn tables(&self) -> [&BreakdownTable; 3] {
        [&self.daily, &self.weekly, &self.monthly]
    }

    #[must_use]
    pub fn margin(&self) -> String {
        format!("{:.2}%", self.summary.margin_percent)
    }
}

/// Alert row.
#[derive(Debug, Clone)]
pub struct AlertView {
    pub level: String,
    pub message: String,
    pub created_at: String,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            level: alert.level.to_lowercase(),
            message: alert.message.clone(),
            created_at: alert.created_at.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "analytics/index.html")]
pub struct AnalyticsTemplate {
    pub page: PageContext,
    pub report: Option<ProfitLossView>,
    pub alerts: Vec<AlertView>,
    pub stats: Option<QuickStatsView>,
    pub from: String,
    pub to: String,
    pub export_types: &'static [&'static str],
    pub charts_poll_secs: u64,
    pub alerts_poll_secs: u64,
    pub audit_poll_secs: u64,
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Analytics dashboard.
#[instrument(skip(state, session, credentials, params))]
async fn analytics_page(
    State(state): State<AppState>,
    session: Session,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Params,
) -> impl IntoResponse {
    let mut page = PageContext::load(&state, &session, "/dashboard/analytics").await;

    let report = match state
        .api()
        .profit_loss(&passthrough(&params), &credentials)
        .await
    {
        Ok(report) => Some(ProfitLossView::from_report(&report)),
        Err(e) => {
            page = page.with_error(e.user_message());
            None
        }
    };

    let alerts = feed_or_fetch(&state.feeds().alerts, &credentials, || {
        state.api().analytics_alerts(&credentials)
    })
    .await
    .map(|snapshot| snapshot.data.iter().map(AlertView::from).collect())
    .unwrap_or_default();

    let stats = feed_or_fetch(&state.feeds().quick_stats, &credentials, || {
        state.api().quick_stats(&credentials)
    })
    .await
    .ok()
    .map(|snapshot| QuickStatsView::from(&snapshot.data));

    let poll = state.config().poll;
    AnalyticsTemplate {
        page,
        report,
        alerts,
        stats,
        from: param(&params, "from").unwrap_or_default().to_string(),
        to: param(&params, "to").unwrap_or_default().to_string(),
        export_types: EXPORT_TYPES,
        charts_poll_secs: poll.charts.as_secs(),
        alerts_poll_secs: poll.alerts.as_secs(),
        audit_poll_secs: poll.audit_logs.as_secs(),
    }
}

/// Chart series.
#[instrument(skip(state, credentials, params))]
async fn charts(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Params,
) -> Result<Json<Envelope<Snapshot<Value>>>, AppError> {
    let query = passthrough(&params);
    let snapshot = if query.is_empty() {
        feed_or_fetch(&state.feeds().charts, &credentials, || {
            state.api().analytics_charts(&[], &credentials)
        })
        .await?
    } else {
        Snapshot {
            data: state.api().analytics_charts(&query, &credentials).await?,
            refreshed_at: Utc::now(),
        }
    };
    Ok(ok(snapshot))
}

/// Active alerts.
#[instrument(skip(state, credentials))]
async fn alerts(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
) -> Result<Json<Envelope<Snapshot<Vec<Alert>>>>, AppError> {
    let snapshot = feed_or_fetch(&state.feeds().alerts, &credentials, || {
        state.api().analytics_alerts(&credentials)
    })
    .await?;
    Ok(ok(snapshot))
}

/// Recent audit log entries.
#[instrument(skip(state, credentials, params))]
async fn audit_logs(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Params,
) -> Result<Json<Envelope<Snapshot<Vec<AuditLogEntry>>>>, AppError> {
    let query = passthrough(&params);
    let snapshot = if query.is_empty() {
        feed_or_fetch(&state.feeds().audit_logs, &credentials, || {
            state.api().analytics_audit_logs(&[], &credentials)
        })
        .await?
    } else {
        Snapshot {
            data: state.api().analytics_audit_logs(&query, &credentials).await?,
            refreshed_at: Utc::now(),
        }
    };
    Ok(ok(snapshot))
}

/// Transaction trace.
#[instrument(skip(state, credentials, params))]
async fn trace(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Params,
) -> Result<Json<Envelope<Value>>, AppError> {
    Ok(ok(state
        .api()
        .analytics_trace(&passthrough(&params), &credentials)
        .await?))
}

/// Formatted profit/loss tables and summary.
#[instrument(skip(state, credentials, params))]
async fn profit_loss(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Params,
) -> Result<Json<Envelope<ProfitLossView>>, AppError> {
    let report = state
        .api()
        .profit_loss(&passthrough(&params), &credentials)
        .await?;
    Ok(ok(ProfitLossView::from_report(&report)))
}

/// Filtered audit trail.
#[instrument(skip(state, credentials, params))]
async fn audit_trail(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Query(params): Params,
) -> Result<Json<Envelope<Value>>, AppError> {
    Ok(ok(state
        .api()
        .audit_trail(&passthrough(&params), &credentials)
        .await?))
}

/// Report download, passed through byte for byte.
#[instrument(skip(state, credentials, params))]
async fn export(
    State(state): State<AppState>,
    ApiCredentials(credentials): ApiCredentials,
    Path(export_type): Path<String>,
    Query(params): Params,
) -> Result<Response, AppError> {
    let export_type = export_type.to_ascii_lowercase();
    if !EXPORT_TYPES.contains(&export_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported export type '{export_type}'"
        )));
    }

    let download = state
        .api()
        .analytics_export(&export_type, &passthrough(&params), &credentials)
        .await?;

    let mut response = download.bytes.into_response();
    let headers = response.headers_mut();
    let content_type = download
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);
    let disposition = download
        .content_disposition
        .unwrap_or_else(|| format!("attachment; filename=\"report.{export_type}\""));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sellapp_core::Money;
    use sellapp_core::models::PeriodAggregate;
    use sellapp_core::models::analytics::{RevenueSource, SourceTotals};

    fn period(date: Option<&str>, profit: &str) -> PeriodAggregate {
        PeriodAggregate {
            date: date.map(String::from),
            sales_count: 3,
            revenue: Money::parse_lenient("900"),
            profit: Money::parse_lenient(profit),
        }
    }

    #[test]
    fn test_profit_loss_view_from_report() {
        let report = ProfitLossReport {
            daily: vec![period(Some("2026-03-14"), "-20"), period(Some("garbage"), "10")],
            weekly: vec![],
            monthly: vec![period(Some("2026-03"), "300")],
            sources: vec![SourceTotals {
                source: RevenueSource::Sales,
                revenue: Money::parse_lenient("1000"),
                cost: Money::parse_lenient("750"),
                profit: Money::parse_lenient("250"),
            }],
        };
        let view = ProfitLossView::from_report(&report);

        let first = view.daily.rows.first().unwrap();
        assert_eq!(first.label, "Sat, Mar 14 2026");
        assert!(first.is_loss);
        assert_eq!(view.daily.fallback_dates, vec!["garbage"]);
        assert!(view.weekly.is_empty());
        assert_eq!(view.monthly.rows.first().unwrap().label, "March 2026");
        assert_eq!(view.margin(), "25.00%");
    }

    #[test]
    fn test_param_lookup() {
        let params = vec![
            ("from".to_string(), "2026-01-01".to_string()),
            ("to".to_string(), "2026-01-31".to_string()),
        ];
        assert_eq!(param(&params, "to"), Some("2026-01-31"));
        assert_eq!(param(&params, "missing"), None);
    }
}
