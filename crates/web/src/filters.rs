//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use sellapp_core::Money;

/// Formats an amount with two decimals and thousands separators.
///
/// Accepts anything that displays as a number; junk renders as `0.00`.
///
/// Usage in templates: `{{ product.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(Money::parse_lenient(&value.to_string()).display())
}

/// Shows a dash for empty values.
///
/// Usage in templates: `{{ customer_phone|or_dash }}`
#[askama::filter_fn]
pub fn or_dash(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(if text.trim().is_empty() {
        "-".to_string()
    } else {
        text
    })
}
