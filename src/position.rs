//! Position tracking for a single symbol.

use std::fmt;

use crate::{Price, Symbol, Trade};

/// Running exposure in one instrument.
///
/// Tracks signed size (positive = long, negative = short), weighted-average
/// entry price and realized PnL. Monetary values are in cents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub symbol: Symbol,
    /// Net size: positive = long, negative = short, zero = flat
    size: i64,
    /// Weighted-average entry price, rounded to the cent; PnL uses `total_cost`
    avg_price: Price,
    /// Cumulative realized PnL (cents)
    realized_pnl: i64,
    /// size * entry price, kept unrounded so repeated averaging does not drift
    total_cost: i64,
}

impl Position {
    /// Create a flat position.
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            ..Self::default()
        }
    }

    #[inline]
    pub fn size(&self) -> i64 {
        self.size
    }

    #[inline]
    pub fn avg_price(&self) -> Price {
        self.avg_price
    }

    #[inline]
    pub fn realized_pnl(&self) -> i64 {
        self.realized_pnl
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    #[inline]
    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    /// Signed size that would bring this position to flat.
    #[inline]
    pub fn flat_size(&self) -> i64 {
        -self.size
    }

    /// Apply a fill and return the PnL it realized (cents).
    ///
    /// - same direction (or from flat): entries accumulate into the cost basis
    /// - partial close: the closed share of the basis is realized, the rest
    ///   stays
    /// - full close: the whole basis is realized, position goes flat
    /// - close and reverse: the whole basis is realized, the remainder opens
    ///   at the fill price
    ///
    /// Realized PnL comes from the exact cost basis, so it always matches
    /// cash flow even when the average price is not a whole cent.
    ///
    /// # Panics
    ///
    /// Panics if the trade is for a different symbol.
    pub fn adjust(&mut self, trade: &Trade) -> i64 {
        assert_eq!(
            trade.symbol, self.symbol,
            "cannot adjust {} position with {} trade",
            self.symbol, trade.symbol
        );
        let qty = trade.signed_fill();
        let price = trade.price().0;
        if qty == 0 {
            return 0;
        }

        if self.size == 0 {
            self.size = qty;
            self.avg_price = Price(price);
            self.total_cost = qty * price;
            return 0;
        }

        if (self.size > 0) == (qty > 0) {
            self.total_cost += qty * price;
            self.size += qty;
            self.avg_price = Price(average(self.total_cost, self.size));
            return 0;
        }

        let close_qty = qty.abs().min(self.size.abs());
        let removed = if close_qty == self.size.abs() {
            self.total_cost
        } else {
            (self.total_cost as i128 * close_qty as i128 / self.size.abs() as i128) as i64
        };
        let pnl = self.size.signum() * close_qty * price - removed;
        self.realized_pnl += pnl;

        let net = self.size + qty;
        if net == 0 {
            self.size = 0;
            self.avg_price = Price::ZERO;
            self.total_cost = 0;
        } else if (net > 0) == (self.size > 0) {
            self.total_cost -= removed;
            self.size = net;
            self.avg_price = Price(average(self.total_cost, self.size));
        } else {
            self.size = net;
            self.avg_price = Price(price);
            self.total_cost = net * price;
        }
        pnl
    }

    /// Per-share points `trade` would realize against this position.
    ///
    /// Zero when the trade opens or adds to the position.
    pub fn close_points(&self, trade: &Trade) -> i64 {
        if self.size == 0 || (self.size > 0) == (trade.side.sign() > 0) {
            return 0;
        }
        self.points_against(trade.price().0)
    }

    /// Market value at the given price (cents).
    #[inline]
    pub fn market_value(&self, price: Price) -> i64 {
        self.size * price.0
    }

    /// Unrealized PnL at the given market price (cents).
    #[inline]
    pub fn unrealized_pnl(&self, price: Price) -> i64 {
        self.size * price.0 - self.total_cost
    }

    fn points_against(&self, price: i64) -> i64 {
        if self.size > 0 {
            price - self.avg_price.0
        } else {
            self.avg_price.0 - price
        }
    }
}

fn average(total_cost: i64, size: i64) -> i64 {
    if size == 0 { 0 } else { total_cost / size }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {}", self.symbol, self.size, self.avg_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Order, Side, Tick};

    fn sym() -> Symbol {
        Symbol::new("TST")
    }

    fn fill(side: Side, size: u64, cents: i64) -> Trade {
        Order::new("TST", side, size)
            .unwrap()
            .fill(&Tick::trade("TST", 20080509, 93500, Price(cents), size, "NYSE"))
    }

    #[test]
    fn new_position_is_flat() {
        let pos = Position::new(sym());
        assert!(pos.is_flat());
        assert_eq!(pos.realized_pnl(), 0);
        assert_eq!(pos.unrealized_pnl(Price(100_00)), 0);
    }

    #[test]
    fn open_long() {
        let mut pos = Position::new(sym());
        assert_eq!(pos.adjust(&fill(Side::Buy, 100, 50_00)), 0);
        assert_eq!(pos.size(), 100);
        assert_eq!(pos.avg_price(), Price(50_00));
        assert_eq!(pos.market_value(Price(55_00)), 100 * 55_00);
        assert_eq!(pos.unrealized_pnl(Price(55_00)), 100 * 5_00);
    }

    #[test]
    fn add_to_long_blends_average() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Buy, 100, 50_00));
        assert_eq!(pos.adjust(&fill(Side::Buy, 300, 60_00)), 0);
        assert_eq!(pos.size(), 400);
        assert_eq!(pos.avg_price(), Price(57_50));
    }

    #[test]
    fn full_close_realizes_everything() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Buy, 100, 10_00));
        let pnl = pos.adjust(&fill(Side::Sell, 100, 12_00));
        assert_eq!(pnl, 200_00);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_price(), Price::ZERO);
        assert_eq!(pos.realized_pnl(), 200_00);
    }

    #[test]
    fn partial_close_keeps_average() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Buy, 100, 50_00));
        let pnl = pos.adjust(&fill(Side::Sell, 40, 60_00));
        assert_eq!(pnl, 40 * 10_00);
        assert_eq!(pos.size(), 60);
        assert_eq!(pos.avg_price(), Price(50_00));
    }

    #[test]
    fn fractional_average_realizes_cash_flow() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Buy, 1, 10_00));
        pos.adjust(&fill(Side::Buy, 2, 10_01));
        assert_eq!(pos.avg_price(), Price(10_00));
        assert_eq!(pos.unrealized_pnl(Price(11_00)), 3 * 11_00 - 30_02);

        let pnl = pos.adjust(&fill(Side::Sell, 3, 11_00));
        assert_eq!(pnl, 3 * 11_00 - (10_00 + 2 * 10_01));
        assert!(pos.is_flat());
    }

    #[test]
    fn fractional_average_partial_closes_sum_to_cash_flow() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Buy, 1, 10_00));
        pos.adjust(&fill(Side::Buy, 2, 10_01));
        let first = pos.adjust(&fill(Side::Sell, 1, 11_00));
        let second = pos.adjust(&fill(Side::Sell, 2, 11_00));
        assert_eq!(first + second, 298);
        assert_eq!(pos.realized_pnl(), 298);

        let mut short = Position::new(sym());
        short.adjust(&fill(Side::Sell, 1, 10_00));
        short.adjust(&fill(Side::Sell, 2, 10_01));
        let first = short.adjust(&fill(Side::Buy, 2, 9_00));
        let second = short.adjust(&fill(Side::Buy, 1, 9_00));
        assert_eq!(first + second, (10_00 + 2 * 10_01) - 3 * 9_00);
        assert!(short.is_flat());
    }

    #[test]
    fn close_and_reverse() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Buy, 100, 10_00));
        let pnl = pos.adjust(&fill(Side::Sell, 150, 12_00));
        assert_eq!(pnl, 200_00);
        assert_eq!(pos.size(), -50);
        assert_eq!(pos.avg_price(), Price(12_00));
        assert!(pos.is_short());
    }

    #[test]
    fn partial_cover_of_short_keeps_average() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Sell, 100, 50_00));
        let pnl = pos.adjust(&fill(Side::Buy, 50, 45_00));
        assert_eq!(pnl, 50 * 5_00);
        assert_eq!(pos.size(), -50);
        assert_eq!(pos.avg_price(), Price(50_00));
    }

    #[test]
    fn short_position_unrealized() {
        let mut pos = Position::new(sym());
        pos.adjust(&fill(Side::Sell, 100, 50_00));
        assert_eq!(pos.unrealized_pnl(Price(45_00)), 100 * 5_00);
        assert_eq!(pos.unrealized_pnl(Price(55_00)), -100 * 5_00);
        assert_eq!(pos.flat_size(), 100);
    }

    #[test]
    fn close_points() {
        let mut pos = Position::new(sym());
        let opening = fill(Side::Buy, 100, 10_00);
        assert_eq!(pos.close_points(&opening), 0);
        pos.adjust(&opening);
        assert_eq!(pos.close_points(&fill(Side::Buy, 10, 11_00)), 0);
        assert_eq!(pos.close_points(&fill(Side::Sell, 10, 11_50)), 1_50);
    }

    #[test]
    #[should_panic(expected = "cannot adjust")]
    fn wrong_symbol_panics() {
        let mut pos = Position::new(Symbol::new("IBM"));
        pos.adjust(&fill(Side::Buy, 1, 1_00));
    }
}
