//! Market events: trade prints and top-of-book quotes.

use std::fmt;

use crate::{Date, Price, Quantity, Symbol, Time};

/// One market event for a symbol.
///
/// A trade tick carries the printed `price` and `size`. A quote-only tick
/// has `is_trade == false` and carries a bid and/or ask instead; the broker
/// never fills against quotes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick {
    pub symbol: Symbol,
    pub date: Date,
    pub time: Time,
    /// Trade price (zero for quotes)
    pub price: Price,
    /// Trade size, or quote size for quote ticks
    pub size: Quantity,
    pub exchange: String,
    pub is_trade: bool,
    pub bid: Option<Price>,
    pub ask: Option<Price>,
}

impl Tick {
    /// A trade print.
    pub fn trade(
        symbol: &str,
        date: Date,
        time: Time,
        price: Price,
        size: Quantity,
        exchange: &str,
    ) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            date,
            time,
            price,
            size,
            exchange: exchange.to_string(),
            is_trade: true,
            bid: None,
            ask: None,
        }
    }

    /// A bid quote.
    pub fn bid(symbol: &str, date: Date, time: Time, bid: Price, size: Quantity) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            date,
            time,
            price: Price::ZERO,
            size,
            exchange: String::new(),
            is_trade: false,
            bid: Some(bid),
            ask: None,
        }
    }

    /// An ask quote.
    pub fn ask(symbol: &str, date: Date, time: Time, ask: Price, size: Quantity) -> Self {
        Self {
            bid: None,
            ask: Some(ask),
            ..Self::bid(symbol, date, time, Price::ZERO, size)
        }
    }

    /// Same tick with an exchange tag.
    pub fn on(mut self, exchange: &str) -> Self {
        self.exchange = exchange.to_string();
        self
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_trade {
            write!(
                f,
                "{}:{:06} {} {}@{}",
                self.date, self.time, self.symbol, self.size, self.price
            )
        } else {
            let bid = self.bid.map(|p| p.to_string()).unwrap_or_default();
            let ask = self.ask.map(|p| p.to_string()).unwrap_or_default();
            write!(
                f,
                "{}:{:06} {} {}x{} ({})",
                self.date, self.time, self.symbol, bid, ask, self.size
            )
        }
    }
}
