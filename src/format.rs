//! Formatter – turns amounts, dates and free text into display strings.
//!
//! Formatting is locale-agnostic: dot decimal, comma grouping, whatever the
//! currency code is. The code is only a label.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

/// Column width (in characters) of free-text description cells.
pub const DESCRIPTION_WIDTH: usize = 20;

const ELLIPSIS: &str = "...";

/// `KES 12,345.67` – two fraction digits, grouped thousands.
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let grouped = group_thousands(amount);
    if currency.is_empty() {
        grouped
    } else {
        format!("{currency} {grouped}")
    }
}

/// Format an amount with exactly two fraction digits and comma grouping.
pub fn group_thousands(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        // -0.001 rounds to a signed zero.
        rounded = Decimal::ZERO;
    }
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
    if rounded.is_sign_negative() {
        out.push('-');
    }
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_period(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} to {}", format_date(start), format_date(end))
}

/// Clip `text` to `width` characters. Longer text keeps its first
/// `width - 3` characters followed by `...`, so the result is exactly
/// `width` characters long.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
