//! Profit/loss breakdown tables.
//!
//! The API aggregates sales into daily, weekly and monthly periods. This
//! module only formats those rows for display: it labels each period and
//! flags losses. Dates that cannot be parsed are labelled with `today` and
//! reported in [`BreakdownTable::fallback_dates`] so the caller can log them.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::analytics::SourceTotals;
use crate::models::PeriodAggregate;
use crate::types::Money;

/// Monthly tables longer than this are put in a scroll container.
pub const MONTHLY_SCROLL_THRESHOLD: usize = 6;

/// Aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Table heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Daily => "Daily Breakdown",
            Self::Weekly => "Weekly Breakdown",
            Self::Monthly => "Monthly Breakdown",
        }
    }

    /// Message shown when the period list is empty.
    #[must_use]
    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Daily => "No daily data for this range",
            Self::Weekly => "No weekly data for this range",
            Self::Monthly => "No monthly data for this range",
        }
    }

    /// Format a period start date.
    #[must_use]
    pub fn label(self, date: NaiveDate) -> String {
        match self {
            Self::Daily => date.format("%a, %b %d %Y").to_string(),
            Self::Weekly => date.format("Week of %b %d, %Y").to_string(),
            Self::Monthly => date.format("%B %Y").to_string(),
        }
    }
}

/// Parse a period date in any of the shapes the API emits.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM` (first of the month).
#[must_use]
pub fn parse_period_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())
}

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub label: String,
    pub sales_count: u64,
    pub revenue: Money,
    pub profit: Money,
    /// `profit < 0`; rendered red.
    pub is_loss: bool,
}

impl BreakdownRow {
    /// CSS class for the profit cell.
    #[must_use]
    pub const fn profit_class(&self) -> &'static str {
        if self.is_loss {
            "text-red-600"
        } else {
            "text-green-600"
        }
    }
}

/// A rendered breakdown for one granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownTable {
    pub granularity: Granularity,
    pub rows: Vec<BreakdownRow>,
    /// Wrap in a scroll container.
    pub scrollable: bool,
    /// Raw date values that were missing or unparsable.
    pub fallback_dates: Vec<String>,
}

impl BreakdownTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub const fn empty_message(&self) -> &'static str {
        self.granularity.empty_message()
    }
}

/// Format aggregates for one granularity. Never fails.
#[must_use]
pub fn build_table(
    granularity: Granularity,
    periods: &[PeriodAggregate],
    today: NaiveDate,
) -> BreakdownTable {
    let mut fallback_dates = Vec::new();
    let rows = periods
        .iter()
        .map(|period| {
            let raw = period.date.as_deref().unwrap_or_default();
            let date = parse_period_date(raw).unwrap_or_else(|| {
                fallback_dates.push(raw.to_string());
                today
            });
            BreakdownRow {
                label: granularity.label(date),
                sales_count: period.sales_count,
                revenue: period.revenue,
                profit: period.profit,
                is_loss: period.profit.is_negative(),
            }
        })
        .collect::<Vec<_>>();

    BreakdownTable {
        granularity,
        scrollable: granularity == Granularity::Monthly && rows.len() > MONTHLY_SCROLL_THRESHOLD,
        rows,
        fallback_dates,
    }
}

/// Overall totals across revenue sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossSummary {
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    /// `profit / revenue * 100`, two places; zero when revenue is zero.
    pub margin_percent: Decimal,
    pub sources: Vec<SourceTotals>,
}

impl ProfitLossSummary {
    #[must_use]
    pub fn from_sources(sources: &[SourceTotals]) -> Self {
        let revenue: Money = sources.iter().map(|s| s.revenue).sum();
        let cost: Money = sources.iter().map(|s| s.cost).sum();
        let profit: Money = sources.iter().map(|s| s.profit).sum();

        let margin_percent = if revenue.amount().is_zero() {
            Decimal::ZERO
        } else {
            (profit.amount() * Decimal::ONE_HUNDRED / revenue.amount()).round_dp(2)
        };

        Self {
            revenue,
            cost,
            profit,
            margin_percent,
            sources: sources.to_vec(),
        }
    }

    #[must_use]
    pub fn is_loss(&self) -> bool {
        self.profit.is_negative()
    }
}
