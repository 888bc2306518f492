//! Fixed-point money amounts
//!
//! Prices are stored as integer minor units (kopecks) and rendered with two
//! decimals, e.g. `Money::from_minor(150000)` serializes as `"1500.00"`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A non-negative amount with two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

/// Errors produced while parsing a money amount
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("A valid number is required.")]
    Invalid,

    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimals,

    #[error("Ensure this value is greater than or equal to 0.")]
    Negative,
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Amount in minor units
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Whether the amount fits a decimal column with `max_digits` total digits
    /// and two decimal places.
    pub fn fits(&self, max_digits: u32) -> bool {
        let whole_digits = max_digits.saturating_sub(2);
        let whole = self.0 / 100;
        whole < 10i64.saturating_pow(whole_digits)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(MoneyError::Negative);
        }
        let s = s.strip_prefix('+').unwrap_or(s);

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyError::Invalid);
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyError::Invalid);
        }

        let frac = frac.trim_end_matches('0');
        if frac.len() > 2 {
            return Err(MoneyError::TooManyDecimals);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::Invalid)?
        };
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyError::Invalid)? * 10,
            _ => frac.parse().map_err(|_| MoneyError::Invalid)?,
        };

        whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Money)
            .ok_or(MoneyError::Invalid)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Money)
            .ok_or_else(|| E::custom(MoneyError::Invalid))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        if v < 0 {
            return Err(E::custom(MoneyError::Negative));
        }
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom(MoneyError::Invalid))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom(MoneyError::Invalid));
        }
        // Shortest round-trip rendering: 19.99 stays "19.99".
        format!("{}", v).parse().map_err(E::custom)
    }
}
