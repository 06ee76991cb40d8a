//! Broker: per-account order and trade blotters with print-driven matching.
//!
//! Orders rest in the account that submitted them until a trade tick for
//! their symbol satisfies their price condition. Matching only looks at the
//! last trade print and its size; there is no depth.

use std::fmt;

use log::{debug, trace, warn};
use rustc_hash::FxHashMap;

use crate::account::Account;
use crate::error::{LookupError, ValidationError};
use crate::{Order, Position, Symbol, Tick, Trade};

/// Signals raised by the broker, delivered synchronously to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerEvent {
    /// Raised first on every `execute` call.
    Tick(Tick),
    /// An order was accepted into an account.
    OrderAccepted(Order),
    /// A resting order filled.
    Fill(Trade),
    /// An order or account was refused.
    Warning(String),
}

type Observer = Box<dyn FnMut(&BrokerEvent) + Send>;

/// Blotters for one account.
#[derive(Clone, Debug)]
struct AccountBook {
    account: Account,
    orders: Vec<Order>,
    trades: Vec<Trade>,
}

impl AccountBook {
    fn new(account: Account) -> Self {
        Self {
            account,
            orders: Vec::new(),
            trades: Vec::new(),
        }
    }
}

/// Simulated broker holding open orders and fills for any number of accounts.
///
/// Accounts are kept in the order they were first used. `execute` walks them
/// in that order, and each account's orders in submission order, so the same
/// inputs always produce the same fills.
///
/// ```
/// use gauntlet::{Broker, Order, Price, Side, Tick};
///
/// let mut broker = Broker::new();
/// let order = Order::limit("IBM", Side::Buy, 100, Price(10_00)).unwrap();
/// assert!(broker.send_order(order));
///
/// let filled = broker.execute(&Tick::trade("IBM", 20080509, 93500, Price(10_00), 100, "NYSE"));
/// assert_eq!(filled, 1);
/// assert!(broker.order_list().is_empty());
/// assert_eq!(broker.trade_list()[0].price(), Price(10_00));
/// ```
pub struct Broker {
    /// Registration order; the default account is always first
    books: Vec<AccountBook>,
    index: FxHashMap<String, usize>,
    observers: Vec<Observer>,
}

impl Broker {
    /// Create a broker with an empty default account.
    pub fn new() -> Self {
        let mut broker = Self {
            books: Vec::new(),
            index: FxHashMap::default(),
            observers: Vec::new(),
        };
        broker.reset();
        broker
    }

    /// Register an observer for ticks, accepted orders, fills and warnings.
    ///
    /// Observers run on whatever thread drives the broker, in registration
    /// order, before the triggering call returns.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&BrokerEvent) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// The account used by the methods without an explicit account.
    pub fn default_account(&self) -> &Account {
        &self.books[0].account
    }

    // === Order Submission ===

    /// Send an order to the default account.
    pub fn send_order(&mut self, order: Order) -> bool {
        let account = self.books[0].account.clone();
        self.send_order_for(order, &account)
    }

    /// Send an order to `account`, registering the account on first use.
    ///
    /// Invalid orders or accounts are not errors: a warning is raised and
    /// `false` returned, leaving every blotter untouched.
    pub fn send_order_for(&mut self, mut order: Order, account: &Account) -> bool {
        let refusal = match order.validate() {
            Err(e) => Some(format!("invalid order {order}: {e}")),
            Ok(()) if !account.is_valid() => Some(format!(
                "invalid account {account:?}: {}",
                ValidationError::InvalidAccount
            )),
            Ok(()) => None,
        };
        if let Some(message) = refusal {
            warn!("{message}");
            emit(&mut self.observers, || BrokerEvent::Warning(message));
            return false;
        }

        order.account = account.id.clone();
        debug!("accepted {} for {}", order, account.id);
        emit(&mut self.observers, || BrokerEvent::OrderAccepted(order.clone()));
        let slot = self.register(account);
        self.books[slot].orders.push(order);
        true
    }

    // === Matching ===

    /// Fill every resting order the tick allows and return how many filled.
    ///
    /// Quote-only ticks never fill. A trade tick of size `S` fills at most
    /// `S` shares in total across all accounts; an order either fills
    /// completely or stays open.
    pub fn execute(&mut self, tick: &Tick) -> usize {
        trace!("tick {tick}");
        emit(&mut self.observers, || BrokerEvent::Tick(tick.clone()));
        if !tick.is_trade {
            return 0;
        }

        let mut available = tick.size;
        let mut filled = 0;
        for book in &mut self.books {
            let mut i = 0;
            while i < book.orders.len() {
                if available == 0 {
                    return filled;
                }
                let order = &book.orders[i];
                if order.symbol != tick.symbol || !order.fills_at(tick.price, available) {
                    i += 1;
                    continue;
                }
                let order = book.orders.remove(i);
                available -= order.size;
                let trade = order.fill(tick);
                debug!("filled {} for {}", trade, book.account.id);
                emit(&mut self.observers, || BrokerEvent::Fill(trade.clone()));
                book.trades.push(trade);
                filled += 1;
            }
        }
        filled
    }

    // === Housekeeping ===

    /// Forget every account, order and trade; keep only an empty default
    /// account. Observers stay registered.
    pub fn reset(&mut self) {
        self.books.clear();
        self.index.clear();
        self.register(&Account::default_account());
    }

    /// Cancel all open orders of the default account.
    pub fn cancel_orders(&mut self) -> usize {
        let cancelled = self.books[0].orders.len();
        self.books[0].orders.clear();
        cancelled
    }

    /// Cancel all open orders of `account`; trade history is kept.
    pub fn cancel_orders_for(&mut self, account: &Account) -> Result<usize, LookupError> {
        let slot = self.slot(&account.id)?;
        let cancelled = self.books[slot].orders.len();
        self.books[slot].orders.clear();
        debug!("cancelled {cancelled} orders for {}", account.id);
        Ok(cancelled)
    }

    // === Blotters ===

    /// Open orders of the default account.
    pub fn order_list(&self) -> &[Order] {
        &self.books[0].orders
    }

    /// Open orders of `account`, in submission order.
    pub fn order_list_for(&self, account: &Account) -> Result<&[Order], LookupError> {
        Ok(&self.book(&account.id)?.orders)
    }

    /// Fills of the default account.
    pub fn trade_list(&self) -> &[Trade] {
        &self.books[0].trades
    }

    /// Fills of `account`, in execution order.
    pub fn trade_list_for(&self, account: &Account) -> Result<&[Trade], LookupError> {
        Ok(&self.book(&account.id)?.trades)
    }

    /// Ids of every known account, in registration order.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.books.iter().map(|b| b.account.id.as_str())
    }

    pub fn has_account(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    // === Positions and PnL ===

    /// Position in `symbol` for the default account.
    pub fn open_position(&self, symbol: &str) -> Position {
        replay(&self.books[0].trades, &Symbol::new(symbol))
    }

    /// Position in `symbol` for `account`, rebuilt from its fills.
    pub fn open_position_for(
        &self,
        symbol: &str,
        account: &Account,
    ) -> Result<Position, LookupError> {
        let book = self.book(&account.id)?;
        Ok(replay(&book.trades, &Symbol::new(symbol)))
    }

    /// Signed size of the open orders for `symbol` in `account`.
    pub fn open_exposure_for(&self, symbol: &str, account: &Account) -> Result<i64, LookupError> {
        let symbol = Symbol::new(symbol);
        Ok(self
            .book(&account.id)?
            .orders
            .iter()
            .filter(|o| o.symbol == symbol)
            .map(Order::signed_size)
            .sum())
    }

    /// Realized PnL (cents) of the default account, for one symbol or all.
    pub fn closed_pl(&self, symbol: Option<&str>) -> i64 {
        closed(&self.books[0].trades, symbol).0
    }

    /// Realized PnL (cents) of `account`, for one symbol or all.
    pub fn closed_pl_for(
        &self,
        symbol: Option<&str>,
        account: &Account,
    ) -> Result<i64, LookupError> {
        Ok(closed(&self.book(&account.id)?.trades, symbol).0)
    }

    /// Realized per-share points (cents) of the default account.
    pub fn closed_pt(&self, symbol: Option<&str>) -> i64 {
        closed(&self.books[0].trades, symbol).1
    }

    /// Realized per-share points (cents) of `account`, for one symbol or all.
    pub fn closed_pt_for(
        &self,
        symbol: Option<&str>,
        account: &Account,
    ) -> Result<i64, LookupError> {
        Ok(closed(&self.book(&account.id)?.trades, symbol).1)
    }

    // === Internal ===

    fn register(&mut self, account: &Account) -> usize {
        if let Some(&slot) = self.index.get(&account.id) {
            return slot;
        }
        let slot = self.books.len();
        self.books.push(AccountBook::new(account.clone()));
        self.index.insert(account.id.clone(), slot);
        slot
    }

    fn slot(&self, id: &str) -> Result<usize, LookupError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| LookupError::UnknownAccount(id.to_string()))
    }

    fn book(&self, id: &str) -> Result<&AccountBook, LookupError> {
        Ok(&self.books[self.slot(id)?])
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("books", &self.books)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Deliver an event, building it only when someone listens.
fn emit(observers: &mut [Observer], event: impl FnOnce() -> BrokerEvent) {
    if observers.is_empty() {
        return;
    }
    let event = event();
    for observer in observers.iter_mut() {
        observer(&event);
    }
}

fn replay(trades: &[Trade], symbol: &Symbol) -> Position {
    let mut pos = Position::new(symbol.clone());
    for trade in trades.iter().filter(|t| &t.symbol == symbol) {
        pos.adjust(trade);
    }
    pos
}

/// (realized PnL, realized points) over `trades`, one running position per
/// symbol.
fn closed(trades: &[Trade], symbol: Option<&str>) -> (i64, i64) {
    let only = symbol.map(Symbol::new);
    let mut positions: FxHashMap<Symbol, Position> = FxHashMap::default();
    let (mut pl, mut pt) = (0, 0);
    for trade in trades {
        if only.as_ref().is_some_and(|s| s != &trade.symbol) {
            continue;
        }
        let pos = positions
            .entry(trade.symbol.clone())
            .or_insert_with(|| Position::new(trade.symbol.clone()));
        pt += pos.close_points(trade);
        pl += pos.adjust(trade);
    }
    (pl, pt)
}
