//! Order side: Buy or Sell

use std::fmt;

use crate::error::ParseError;

/// Side of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for buys, -1 for sells.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    /// Side implied by a signed size. Zero maps to `Sell`, matching a
    /// "size > 0 means buy" convention.
    #[inline]
    pub fn from_signed(size: i64) -> Self {
        if size > 0 { Side::Buy } else { Side::Sell }
    }

    /// Single-letter code used in order records.
    #[inline]
    pub fn code(self) -> &'static str {
        match self {
            Side::Buy => "B",
            Side::Sell => "S",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ParseError> {
        match code.trim() {
            "B" | "b" => Ok(Side::Buy),
            "S" | "s" => Ok(Side::Sell),
            other => Err(ParseError::Side(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}
