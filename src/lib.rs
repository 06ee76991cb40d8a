// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # gauntlet
//!
//! A tick-replay broker simulator and backtest driver for testing trading
//! strategies against historical prints.
//!
//! ## Features
//!
//! - **Order types**: Market, Limit, Stop
//! - **Print-driven fills**: orders fill in full against trade ticks, capped
//!   by the print size; quotes never fill
//! - **Accounts**: separate blotters per account, visited in registration
//!   order
//! - **Positions and PnL**: average-price accounting with realized PnL and
//!   per-share points
//! - **Backtests**: replay tick sources through a [`Strategy`] on a worker
//!   thread, with progress events and cancellation
//! - **Fixed-point prices**: Avoid floating-point errors with integer cents
//!
//! ## Quick Start
//!
//! ```
//! use gauntlet::{Broker, Order, Price, Side, Tick};
//!
//! let mut broker = Broker::new();
//!
//! broker.send_order(Order::new("IBM", Side::Buy, 100).unwrap());
//! broker.send_order(Order::limit("IBM", Side::Sell, 100, Price(12_00)).unwrap());
//!
//! // The market order fills on the first print, the limit waits for 12
//! assert_eq!(broker.execute(&Tick::trade("IBM", 20080509, 93500, Price(10_00), 500, "NYSE")), 1);
//! assert_eq!(broker.execute(&Tick::trade("IBM", 20080509, 93600, Price(12_00), 500, "NYSE")), 1);
//!
//! assert!(broker.open_position("IBM").is_flat());
//! assert_eq!(broker.closed_pl(Some("IBM")), 100 * 2_00);
//! ```
//!
//! ## Price Representation
//!
//! Prices are stored as [`i64`] in the smallest unit (e.g., cents):
//!
//! ```
//! use gauntlet::Price;
//!
//! let price = Price(100_50);  // 100.50
//! assert_eq!(price.to_string(), "100.5");
//! assert_eq!("100.50".parse::<Price>().unwrap(), price);
//! ```
//!
//! ## Fill Rules
//!
//! | Order | Fills when the print |
//! |-------|----------------------|
//! | **Market** | has enough size left |
//! | **Buy limit** | is at or below the limit |
//! | **Sell limit** | is at or above the limit |
//! | **Buy stop** | is at or above the stop |
//! | **Sell stop** | is at or below the stop |
//!
//! ## Order Records
//!
//! Orders round-trip through a comma-delimited record:
//!
//! ```
//! use gauntlet::{Order, OrderState, Side};
//!
//! let order = Order::new("IBM", Side::Sell, 200).unwrap().with_comment("exit");
//! let record = order.serialize();
//! assert_eq!(record, "IBM,S,200,0,0,exit,,,STK,USD");
//!
//! let back = Order::deserialize(&record).unwrap();
//! assert_eq!(back, order);
//! assert_eq!(back.state, OrderState::Pending);
//! ```
//!
//! ## Observers
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use gauntlet::{Broker, BrokerEvent, Order, Price, Side, Tick};
//!
//! let fills = Arc::new(Mutex::new(0));
//! let counter = Arc::clone(&fills);
//!
//! let mut broker = Broker::new();
//! broker.subscribe(move |event| {
//!     if let BrokerEvent::Fill(_) = event {
//!         *counter.lock().unwrap() += 1;
//!     }
//! });
//! broker.send_order(Order::new("IBM", Side::Buy, 10).unwrap());
//! broker.execute(&Tick::trade("IBM", 20080509, 93500, Price(10_00), 10, "NYSE"));
//! assert_eq!(*fills.lock().unwrap(), 1);
//! ```

mod account;
pub mod backtest;
pub mod bar;
mod broker;
mod error;
mod order;
mod position;
mod security;
mod side;
pub mod strategy;
mod tick;
mod trade;
mod types;

// Re-export public API
pub use account::{Account, DEFAULT_ACCOUNT_ID};
pub use backtest::{
    Backtest, BacktestConfig, BacktestError, BacktestEvent, BacktestHandle, BacktestReport,
    RunState, TickSource,
};
pub use bar::{Bar, BarInterval, BarList};
pub use broker::{Broker, BrokerEvent};
pub use error::{LookupError, ParseError, ValidationError};
pub use order::{
    Execution, Order, OrderField, OrderKind, OrderState, RECORD_DELIMITER, RECORD_FIELDS,
};
pub use position::Position;
pub use security::{Currency, Security};
pub use side::Side;
pub use strategy::{Decision, Strategy};
pub use tick::Tick;
pub use trade::Trade;
pub use types::{Date, Price, Quantity, Symbol, Time};
