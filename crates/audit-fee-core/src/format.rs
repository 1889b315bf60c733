use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuditFeeError;
use crate::types::Money;

/// Amount units used on the financial data screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Lakhs,
    Millions,
}

impl FromStr for Unit {
    type Err = AuditFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lakh" | "lakhs" => Ok(Unit::Lakhs),
            "million" | "millions" => Ok(Unit::Millions),
            _ => Err(AuditFeeError::InvalidInput {
                field: "unit".into(),
                reason: format!("unknown unit '{s}' (expected lakhs or millions)"),
            }),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Lakhs => f.write_str("lakhs"),
            Unit::Millions => f.write_str("millions"),
        }
    }
}

/// Indian digit grouping of an unsigned integer string: last three digits,
/// then pairs (12,34,567).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

fn grouped(amount: Money, dp: u32, fixed: bool) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let text = if fixed {
        format!("{rounded:.prec$}", prec = dp as usize)
    } else {
        rounded.normalize().to_string()
    };
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{}.{f}", group_indian(int_part)),
        None => format!("{sign}{}", group_indian(int_part)),
    }
}

/// Rupee amount with Indian grouping and two decimals, e.g. `₹12,34,567.00`.
pub fn format_inr(amount: Money, with_symbol: bool) -> String {
    let body = grouped(amount, 2, true);
    if !with_symbol {
        return body;
    }
    match body.strip_prefix('-') {
        Some(rest) => format!("-₹{rest}"),
        None => format!("₹{body}"),
    }
}

/// Indian grouping with up to three decimals and no trailing zeros.
pub fn format_indian_number(amount: Money) -> String {
    grouped(amount, 3, false)
}

/// Signed percentage change, e.g. `+12.50%`. `None` when `old` is zero or
/// the change is outside the decimal range.
pub fn percentage_change(old: Money, new: Money, decimals: u32) -> Option<String> {
    if old.is_zero() {
        return None;
    }
    let change = new
        .checked_sub(old)
        .and_then(|delta| delta.checked_div(old))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))?;
    let change = change.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let sign = if change >= Decimal::ZERO { "+" } else { "" };
    Some(format!("{sign}{change:.prec$}%", prec = decimals as usize))
}

/// 1 million = 10 lakhs.
pub fn convert_unit(value: Money, from: Unit, to: Unit) -> Money {
    match (from, to) {
        (Unit::Lakhs, Unit::Millions) => value / Decimal::TEN,
        (Unit::Millions, Unit::Lakhs) => value.saturating_mul(Decimal::TEN),
        _ => value,
    }
}
