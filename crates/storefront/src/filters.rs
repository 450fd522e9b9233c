//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Format a decimal amount as a dollar price.
///
/// Usage in templates: `{{ line.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&value.to_string()))
}

/// Normalize a decimal string to a two-place dollar amount.
fn format_money(raw: &str) -> String {
    raw.parse::<Decimal>()
        .map_or_else(|_| format!("${raw}"), |amount| format!("${amount:.2}"))
}
