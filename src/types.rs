//! Core types: Price, Quantity, Date, Time, Symbol

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Price in cents.
///
/// `Price(10050)` represents 100.50. Fixed-point avoids floating-point drift
/// when averaging entry prices. `Price::ZERO` doubles as "unset" for the
/// limit and stop fields of an order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Returns true if this price is unset (zero).
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    /// Plain decimal form used by order records: `10`, `10.5`, `10.25`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let units = self.0.abs() / 100;
        let cents = self.0.abs() % 100;
        match cents {
            0 => write!(f, "{sign}{units}"),
            c if c % 10 == 0 => write!(f, "{sign}{units}.{}", c / 10),
            c => write!(f, "{sign}{units}.{c:02}"),
        }
    }
}

impl FromStr for Price {
    type Err = ParseError;

    /// Parse a decimal with at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::Number(s.to_string());
        let t = s.trim();
        let (negative, digits) = match t.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, t),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(bad());
        }
        if frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(bad());
        }
        let units: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| bad())? };
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| bad())? * 10,
            _ => frac.parse().map_err(|_| bad())?,
        };
        let value = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(bad)?;
        Ok(Price(if negative { -value } else { value }))
    }
}

/// Quantity of shares/contracts. Always positive.
pub type Quantity = u64;

/// Calendar date encoded as `YYYYMMDD`.
pub type Date = u32;

/// Time of day encoded as `HHMMSS`.
pub type Time = u32;

/// Instrument identifier, trimmed and uppercased on construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: &str) -> Self {
        Symbol(s.trim().to_uppercase())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
