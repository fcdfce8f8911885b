//! Display-only rounding and formatting. Nothing here feeds back into a
//! calculation; model outputs keep full precision.

use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;

use crate::types::{Money, Multiple, Rate, Years};

/// Placeholder shown for undefined quantities (no debt, no payback, ...).
pub const NOT_APPLICABLE: &str = "—";

/// Round to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `$1,234,567.89`, negatives as `-$1,234.00`.
pub fn format_currency(value: Money) -> String {
    let rounded = round_money(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// `1.25x`, or the placeholder when undefined.
pub fn format_multiple(value: Option<Multiple>) -> String {
    match value {
        Some(v) => format!(
            "{:.2}x",
            v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => NOT_APPLICABLE.to_string(),
    }
}

/// Decimal rate rendered as a percentage: `0.1234` → `12.34%`.
pub fn format_percent(value: Option<Rate>, decimals: u32) -> String {
    match value {
        Some(v) => {
            let pct = (v * dec!(100))
                .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}%", decimals as usize, pct)
        }
        None => NOT_APPLICABLE.to_string(),
    }
}

pub fn format_years(value: Option<Years>) -> String {
    match value {
        Some(v) => format!(
            "{:.1} yrs",
            v.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        ),
        None => NOT_APPLICABLE.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
