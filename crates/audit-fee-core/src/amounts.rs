//! Lenient numeric input.
//!
//! Wizard fields arrive as JSON numbers, numeric strings or empty strings.
//! Anything that does not parse is treated as missing rather than raised.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::Deserializer;
use std::fmt;
use std::str::FromStr;

use crate::types::Money;

/// Parse a user-entered amount, keeping the longest valid numeric prefix.
///
/// `"150000"` -> 150000, `" 12.5 "` -> 12.5, `"12.5abc"` -> 12.5,
/// `"1e5"` -> 100000, `""` / `"abc"` -> None.
pub fn parse_amount(text: &str) -> Option<Money> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if let Ok(value) = Decimal::from_str(unsigned) {
        return Some(value);
    }
    if let Ok(value) = Decimal::from_scientific(unsigned) {
        return Some(value);
    }
    let prefix = numeric_prefix(unsigned)?;
    Decimal::from_str(&prefix).ok()
}

/// Missing amounts count as zero.
pub fn amount_or_zero(value: Option<Money>) -> Money {
    value.unwrap_or(Decimal::ZERO)
}

fn numeric_prefix(text: &str) -> Option<String> {
    let mut out = String::new();
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in text.chars().enumerate() {
        match c {
            '-' if i == 0 => out.push(c),
            '0'..='9' => {
                seen_digit = true;
                out.push(c);
            }
            '.' if !seen_dot => {
                seen_dot = true;
                out.push(c);
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }
    let trimmed = out.trim_end_matches('.');
    // ".5" and "-.5"
    let fixed = if let Some(rest) = trimmed.strip_prefix("-.") {
        format!("-0.{rest}")
    } else if let Some(rest) = trimmed.strip_prefix('.') {
        format!("0.{rest}")
    } else {
        trimmed.to_string()
    };
    Some(fixed)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Option<Money>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string or an empty value")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Decimal::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(parse_amount(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(AmountVisitor)
    }
}

/// `Option<Money>` fields: empty or unparsable input becomes `None`,
/// `None` is written back as `""`.
pub mod lenient_opt {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<Money>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&v.to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Money>, D::Error> {
        d.deserialize_any(AmountVisitor)
    }
}

/// `Money` fields: empty or unparsable input becomes zero.
pub mod lenient {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Money, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Money, D::Error> {
        Ok(amount_or_zero(d.deserialize_any(AmountVisitor)?))
    }
}

/// Counts (e.g. number of branches): negative, fractional or invalid input
/// collapses to a non-negative whole number.
pub mod lenient_count {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = amount_or_zero(d.deserialize_any(AmountVisitor)?);
        if value <= Decimal::ZERO {
            return Ok(0);
        }
        Ok(value.trunc().to_u32().unwrap_or(u32::MAX))
    }
}

/// Directory ids: a positive whole number, a numeric string, or nothing.
/// Written back as a JSON number or `null`.
pub mod lenient_id {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => s.serialize_u32(*id),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let value = d.deserialize_any(AmountVisitor)?;
        Ok(value
            .filter(|v| *v > Decimal::ZERO && v.fract().is_zero())
            .and_then(|v| v.to_u32()))
    }
}
