//! The seam between the backtest driver and user trading logic.

use crate::{BarList, Position, Tick};

/// What a strategy wants after seeing a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decision {
    /// Desired signed position; `None` leaves orders alone
    pub target: Option<i64>,
    /// Indicator values for this tick, aligned with `indicator_names`
    pub indicators: Option<Vec<f64>>,
}

impl Decision {
    /// No change.
    pub fn hold() -> Self {
        Self::default()
    }

    /// Move the position to `size` (positive long, negative short).
    pub fn target(size: i64) -> Self {
        Self {
            target: Some(size),
            indicators: None,
        }
    }

    /// Go flat.
    pub fn flat() -> Self {
        Self::target(0)
    }

    pub fn with_indicators(mut self, values: Vec<f64>) -> Self {
        self.indicators = Some(values);
        self
    }
}

/// Trading logic driven by [`Backtest`](crate::Backtest).
///
/// `evaluate` sees each trade tick once, after the broker has filled
/// whatever that tick allows, together with the symbol's bars and the
/// account's current position. Returning an error faults the run.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Column names for the values returned in [`Decision::indicators`].
    fn indicator_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn evaluate(
        &mut self,
        tick: &Tick,
        bars: &BarList,
        position: &Position,
    ) -> anyhow::Result<Decision>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn indicator_names(&self) -> Vec<String> {
        (**self).indicator_names()
    }

    fn evaluate(
        &mut self,
        tick: &Tick,
        bars: &BarList,
        position: &Position,
    ) -> anyhow::Result<Decision> {
        (**self).evaluate(tick, bars, position)
    }
}
