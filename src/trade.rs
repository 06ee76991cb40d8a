//! Trade representation: an order in its filled state.

use std::fmt;
use std::ops::Deref;

use crate::order::{Execution, Order, OrderState};
use crate::{Price, Quantity};

/// A filled order.
///
/// Only [`Order::fill`] creates trades, so the execution details are always
/// present. Order fields (symbol, side, comment, ...) are reachable through
/// `Deref`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    order: Order,
    execution: Execution,
}

impl Trade {
    pub(crate) fn new(mut order: Order, execution: Execution) -> Self {
        order.state = OrderState::Filled(execution);
        Self { order, execution }
    }

    /// Fill details.
    #[inline]
    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    /// The filled order.
    #[inline]
    pub fn order(&self) -> &Order {
        &self.order
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.execution.price
    }

    /// Executed size, unsigned.
    #[inline]
    pub fn filled_size(&self) -> Quantity {
        self.execution.size
    }

    /// Executed size, positive for buys and negative for sells.
    #[inline]
    pub fn signed_fill(&self) -> i64 {
        self.execution.size as i64 * self.order.side.sign()
    }

    /// Price times executed size, in cents.
    #[inline]
    pub fn notional(&self) -> i64 {
        self.execution.price.0 * self.execution.size as i64
    }

    pub fn into_order(self) -> Order {
        self.order
    }
}

impl Deref for Trade {
    type Target = Order;

    fn deref(&self) -> &Order {
        &self.order
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = &self.execution;
        write!(
            f,
            "{}:{:06} {} {} {}@{}",
            x.date, x.time, self.order.side, x.size, self.order.symbol, x.price
        )?;
        if !self.order.comment.is_empty() {
            write!(f, " {}", self.order.comment)?;
        }
        Ok(())
    }
}
