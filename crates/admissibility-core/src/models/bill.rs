//! Bill line items and amount coercion.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Largest amount accepted from upstream input (10^15). Larger values are
/// clamped so that claim totals stay far below `Decimal::MAX`.
pub const MAX_BILL_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// A single billed line item as extracted from a bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BillItem {
    /// Item description as written on the bill
    #[serde(default, deserialize_with = "deserialize_name")]
    pub name: String,
    /// Billed amount; malformed values deserialize to zero
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

impl BillItem {
    /// Create a bill item.
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }

    /// Items with a blank name are never adjudicated.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Coerce an upstream JSON amount to a non-negative decimal.
///
/// Numbers and numeric strings are accepted; anything else (null, booleans,
/// currency-decorated strings, arrays, objects, negative values) becomes
/// zero.
pub fn coerce_amount(value: &Value) -> Decimal {
    let parsed = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => parse_amount_str(s),
        Value::Null => Some(Decimal::ZERO),
        _ => None,
    };

    match parsed {
        Some(amount) if amount >= Decimal::ZERO => clamp_amount(amount),
        Some(amount) => {
            tracing::warn!(%amount, "Negative bill amount coerced to zero");
            Decimal::ZERO
        }
        None => {
            tracing::warn!(value = %value, "Non-numeric bill amount coerced to zero");
            Decimal::ZERO
        }
    }
}

/// Coerce an `f64` amount (e.g. from FFI) to a non-negative decimal.
pub fn coerce_amount_f64(amount: f64) -> Decimal {
    match Decimal::from_f64(amount) {
        Some(d) if d >= Decimal::ZERO => clamp_amount(d),
        _ => {
            tracing::warn!(amount, "Invalid bill amount coerced to zero");
            Decimal::ZERO
        }
    }
}

fn clamp_amount(amount: Decimal) -> Decimal {
    if amount > MAX_BILL_AMOUNT {
        tracing::warn!(%amount, max = %MAX_BILL_AMOUNT, "Bill amount clamped to maximum");
        return MAX_BILL_AMOUNT;
    }
    amount.normalize()
}

/// Sum amounts, saturating at `Decimal::MAX` instead of overflowing.
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).unwrap_or(Decimal::MAX)
    })
}

fn parse_amount_str(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Round an amount to paise/cents for display.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_amount(&value))
}

fn deserialize_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        _ => String::new(),
    })
}
