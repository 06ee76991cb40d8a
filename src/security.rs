//! Security type and currency codes carried on every order.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Instrument class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Security {
    Nil,
    /// Common stock
    #[default]
    Stk,
    /// Future
    Fut,
    /// Option
    Opt,
    /// Forex
    For,
    /// Index
    Idx,
    /// Bond
    Bnd,
    /// Contract for difference
    Cfd,
    /// Future option
    Fop,
    /// Warrant
    War,
}

impl Security {
    pub fn code(self) -> &'static str {
        match self {
            Security::Nil => "NIL",
            Security::Stk => "STK",
            Security::Fut => "FUT",
            Security::Opt => "OPT",
            Security::For => "FOR",
            Security::Idx => "IDX",
            Security::Bnd => "BND",
            Security::Cfd => "CFD",
            Security::Fop => "FOP",
            Security::War => "WAR",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Security {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "NIL" => Security::Nil,
            "STK" => Security::Stk,
            "FUT" => Security::Fut,
            "OPT" => Security::Opt,
            "FOR" => Security::For,
            "IDX" => Security::Idx,
            "BND" => Security::Bnd,
            "CFD" => Security::Cfd,
            "FOP" => Security::Fop,
            "WAR" => Security::War,
            _ => return Err(ParseError::Security(s.to_string())),
        })
    }
}

/// Settlement currency (ISO 4217 codes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Chf,
    Cad,
    Aud,
    Nzd,
    Hkd,
    Sek,
    Nok,
    Mxn,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Chf => "CHF",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Nzd => "NZD",
            Currency::Hkd => "HKD",
            Currency::Sek => "SEK",
            Currency::Nok => "NOK",
            Currency::Mxn => "MXN",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Currency::Usd,
            "EUR" => Currency::Eur,
            "GBP" => Currency::Gbp,
            "JPY" => Currency::Jpy,
            "CHF" => Currency::Chf,
            "CAD" => Currency::Cad,
            "AUD" => Currency::Aud,
            "NZD" => Currency::Nzd,
            "HKD" => Currency::Hkd,
            "SEK" => Currency::Sek,
            "NOK" => Currency::Nok,
            "MXN" => Currency::Mxn,
            _ => return Err(ParseError::Currency(s.to_string())),
        })
    }
}
