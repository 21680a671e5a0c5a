//! Token quantities with exact decimal arithmetic
//!
//! Subscription amounts and allowances travel over the wire as strings like
//! `"10 USDC"`. This module parses them into a typed [`Amount`] backed by
//! `rust_decimal::Decimal`. **Never use f64 for token quantities** — balance
//! and allowance comparisons happen at smallest-unit precision, where
//! floating point corrupts results.

use crate::{Result, SdkError};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A decimal token quantity paired with its currency code.
///
/// Serializes as its display string (`"10 USDC"`), preserving precision.
///
/// # Examples
///
/// ```rust
/// use chainpay_subscriptions::Amount;
///
/// let amount: Amount = "10 USDC".parse().unwrap();
/// assert_eq!(amount.currency(), "USDC");
/// // USDC has 6 decimals: 10 tokens = 10_000_000 smallest units
/// assert_eq!(amount.to_absolute(6).to_string(), "10000000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    value: Decimal,
    currency: String,
}

impl Amount {
    /// Create from a decimal value and currency code.
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }

    /// Zero of the given currency.
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// The decimal value in display units.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// The currency code (e.g. `"USDC"`).
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// True if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Convert to absolute form: the quantity expressed in the token's
    /// smallest integer unit given its decimal precision.
    ///
    /// All balance/allowance comparisons in the SDK happen in absolute form
    /// so they are exact integer comparisons. Fractional dust below the
    /// smallest unit is truncated. Saturates at `Decimal::MAX` if the scaled
    /// value overflows.
    pub fn to_absolute(&self, decimals: u32) -> Decimal {
        let factor = Decimal::from_i128_with_scale(10i128.pow(decimals.min(28)), 0);
        self.value
            .checked_mul(factor)
            .map(|v| v.trunc())
            .unwrap_or(Decimal::MAX)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

impl FromStr for Amount {
    type Err = SdkError;

    /// Parse `"<value> <CURRENCY>"`, e.g. `"10 USDC"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (value, currency) = match (parts.next(), parts.next(), parts.next()) {
            (Some(value), Some(currency), None) => (value, currency),
            _ => return Err(SdkError::InvalidAmount(s.to_string())),
        };
        let value =
            Decimal::from_str(value).map_err(|_| SdkError::InvalidAmount(s.to_string()))?;
        Ok(Self::new(value, currency))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
