//! Order representation and lifecycle

use std::fmt;

use crate::error::{ParseError, ValidationError};
use crate::trade::Trade;
use crate::{Currency, Date, Price, Quantity, Security, Side, Symbol, Tick, Time};

/// Field delimiter of the order text record.
pub const RECORD_DELIMITER: char = ',';

/// Number of positional fields in an order record.
pub const RECORD_FIELDS: usize = 10;

/// Positions of the fields in an order record. New fields are appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderField {
    Symbol = 0,
    Side,
    Size,
    Price,
    Stop,
    Comment,
    Exchange,
    Account,
    Security,
    Currency,
}

/// How an order is priced, derived from its limit and stop fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderKind {
    /// No limit, no stop
    Market,
    /// Limit set, stop unset
    Limit,
    /// Stop set, limit unset
    Stop,
    /// Both set. Representable but never matched.
    StopLimit,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "Mkt"),
            OrderKind::Limit => write!(f, "Lmt"),
            OrderKind::Stop => write!(f, "Stp"),
            OrderKind::StopLimit => write!(f, "StpLmt"),
        }
    }
}

/// Details of a fill. Only exists once an order is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Execution {
    pub price: Price,
    pub size: Quantity,
    pub date: Date,
    pub time: Time,
}

/// Lifecycle of an order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderState {
    /// Resting with the broker, no fill data
    #[default]
    Pending,
    /// Executed; terminal
    Filled(Execution),
}

/// A trading intent: buy or sell `size` shares of `symbol`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub symbol: Symbol,
    pub side: Side,
    /// Unsigned share count
    pub size: Quantity,
    /// Limit price, `Price::ZERO` when unset
    pub price: Price,
    /// Stop price, `Price::ZERO` when unset
    pub stop: Price,
    pub comment: String,
    /// Submission date
    pub date: Date,
    /// Submission time
    pub time: Time,
    /// Id of the account holding the order; set by the broker on acceptance
    pub account: String,
    pub exchange: String,
    pub security: Security,
    pub currency: Currency,
    pub state: OrderState,
}

impl Order {
    /// Create a market order.
    ///
    /// The symbol is uppercased. Empty symbols and zero sizes are refused.
    pub fn new(symbol: &str, side: Side, size: Quantity) -> Result<Self, ValidationError> {
        let order = Self {
            symbol: Symbol::new(symbol),
            side,
            size,
            price: Price::ZERO,
            stop: Price::ZERO,
            comment: String::new(),
            date: 0,
            time: 0,
            account: String::new(),
            exchange: String::new(),
            security: Security::default(),
            currency: Currency::default(),
            state: OrderState::Pending,
        };
        order.validate()?;
        Ok(order)
    }

    /// Market order whose side follows the sign of `size`.
    pub fn signed(symbol: &str, size: i64) -> Result<Self, ValidationError> {
        Self::new(symbol, Side::from_signed(size), size.unsigned_abs())
    }

    /// Create a limit order.
    pub fn limit(
        symbol: &str,
        side: Side,
        size: Quantity,
        price: Price,
    ) -> Result<Self, ValidationError> {
        let mut order = Self::new(symbol, side, size)?;
        order.price = price;
        Ok(order)
    }

    /// Create a stop order.
    pub fn stop(
        symbol: &str,
        side: Side,
        size: Quantity,
        stop: Price,
    ) -> Result<Self, ValidationError> {
        let mut order = Self::new(symbol, side, size)?;
        order.stop = stop;
        Ok(order)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Stamp the submission date and time.
    pub fn at(mut self, date: Date, time: Time) -> Self {
        self.date = date;
        self.time = time;
        self
    }

    pub fn on(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    /// Why this order cannot be accepted, if anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if self.size == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        if self.size > i64::MAX as u64 {
            return Err(ValidationError::QuantityTooLarge(self.size));
        }
        Ok(())
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn kind(&self) -> OrderKind {
        match (self.price.is_zero(), self.stop.is_zero()) {
            (true, true) => OrderKind::Market,
            (false, true) => OrderKind::Limit,
            (true, false) => OrderKind::Stop,
            (false, false) => OrderKind::StopLimit,
        }
    }

    #[inline]
    pub fn is_market(&self) -> bool {
        self.kind() == OrderKind::Market
    }

    #[inline]
    pub fn is_limit(&self) -> bool {
        !self.price.is_zero()
    }

    #[inline]
    pub fn is_stop(&self) -> bool {
        !self.stop.is_zero()
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        matches!(self.state, OrderState::Filled(_))
    }

    /// Size with the side folded in: positive buys, negative sells.
    #[inline]
    pub fn signed_size(&self) -> i64 {
        self.size as i64 * self.side.sign()
    }

    /// Whether a trade print at `trade` with `available` shares left
    /// would fill this order in full.
    pub fn fills_at(&self, trade: Price, available: Quantity) -> bool {
        if self.size > available {
            return false;
        }
        match (self.kind(), self.side) {
            (OrderKind::Market, _) => true,
            (OrderKind::Limit, Side::Buy) => trade <= self.price,
            (OrderKind::Limit, Side::Sell) => trade >= self.price,
            (OrderKind::Stop, Side::Buy) => trade >= self.stop,
            (OrderKind::Stop, Side::Sell) => trade <= self.stop,
            (OrderKind::StopLimit, _) => false,
        }
    }

    /// Fill the whole order at the tick's price, date and time.
    ///
    /// Consumes the pending order; the returned trade cannot go back.
    pub fn fill(self, tick: &Tick) -> Trade {
        let execution = Execution {
            price: tick.price,
            size: self.size,
            date: tick.date,
            time: tick.time,
        };
        Trade::new(self, execution)
    }

    /// Encode as a delimited record:
    /// `symbol,B|S,size,price,stop,comment,exchange,account,security,currency`.
    ///
    /// Delimiters inside the symbol and free-text fields are replaced by
    /// spaces. Date, time and lifecycle state are not part of the record.
    pub fn serialize(&self) -> String {
        let fields: [String; RECORD_FIELDS] = [
            scrub(self.symbol.as_str()),
            self.side.code().to_string(),
            self.size.to_string(),
            self.price.to_string(),
            self.stop.to_string(),
            scrub(&self.comment),
            scrub(&self.exchange),
            scrub(&self.account),
            self.security.to_string(),
            self.currency.to_string(),
        ];
        fields.join(",")
    }

    /// Decode a record produced by [`Order::serialize`].
    ///
    /// One trailing delimiter is tolerated. The result is always `Pending`:
    /// a record describes an intent, never a settled fill.
    pub fn deserialize(record: &str) -> Result<Self, ParseError> {
        let record = record.trim_end_matches(['\r', '\n']);
        let record = record.strip_suffix(RECORD_DELIMITER).unwrap_or(record);
        let rec: Vec<&str> = record.split(RECORD_DELIMITER).collect();
        if rec.len() != RECORD_FIELDS {
            return Err(ParseError::FieldCount {
                expected: RECORD_FIELDS,
                found: rec.len(),
            });
        }

        let field = |f: OrderField| rec[f as usize];
        let side = Side::from_code(field(OrderField::Side))?;
        let size_text = field(OrderField::Size).trim();
        let size: Quantity = size_text
            .parse()
            .map_err(|_| ParseError::Number(size_text.to_string()))?;

        let mut order = Order::new(field(OrderField::Symbol), side, size)?;
        order.price = field(OrderField::Price).parse()?;
        order.stop = field(OrderField::Stop).parse()?;
        order.comment = field(OrderField::Comment).to_string();
        order.exchange = field(OrderField::Exchange).to_string();
        order.account = field(OrderField::Account).to_string();
        order.security = field(OrderField::Security).parse()?;
        order.currency = field(OrderField::Currency).parse()?;
        Ok(order)
    }
}

fn scrub(text: &str) -> String {
    text.replace(RECORD_DELIMITER, " ")
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:06} {} {} {}@",
            self.date, self.time, self.side, self.size, self.symbol
        )?;
        match self.kind() {
            OrderKind::Market => write!(f, "Market"),
            OrderKind::Limit => write!(f, "{}", self.price),
            OrderKind::Stop => write!(f, "stop {}", self.stop),
            OrderKind::StopLimit => write!(f, "{} stop {}", self.price, self.stop),
        }
    }
}
