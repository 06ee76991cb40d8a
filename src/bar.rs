//! Rolling OHLCV bars built from trade ticks.

use std::fmt;

use crate::{Date, Price, Quantity, Tick, Time};

/// Bar width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarInterval {
    Minute,
    #[default]
    FiveMin,
    FifteenMin,
    ThirtyMin,
    Hour,
}

impl BarInterval {
    #[inline]
    pub fn minutes(self) -> u32 {
        match self {
            BarInterval::Minute => 1,
            BarInterval::FiveMin => 5,
            BarInterval::FifteenMin => 15,
            BarInterval::ThirtyMin => 30,
            BarInterval::Hour => 60,
        }
    }

    /// Opening time (`HHMMSS`) of the bar containing `time`.
    pub fn bar_start(self, time: Time) -> Time {
        let minute_of_day = (time / 10_000) * 60 + (time / 100) % 100;
        let start = minute_of_day / self.minutes() * self.minutes();
        (start / 60) * 10_000 + (start % 60) * 100
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// One OHLCV bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bar {
    pub date: Date,
    /// Bar opening time, `HHMMSS`
    pub time: Time,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Quantity,
}

impl Bar {
    fn open_at(date: Date, time: Time, price: Price, size: Quantity) -> Self {
        Self {
            date,
            time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: size,
        }
    }

    fn update(&mut self, price: Price, size: Quantity) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += size;
    }
}

/// Bars for one symbol, oldest first.
///
/// ```
/// use gauntlet::{BarInterval, BarList, Price, Tick};
///
/// let mut bars = BarList::new(BarInterval::FiveMin);
/// bars.add_tick(&Tick::trade("TST", 20080509, 93000, Price(10_00), 100, ""));
/// bars.add_tick(&Tick::trade("TST", 20080509, 93400, Price(10_50), 100, ""));
/// bars.add_tick(&Tick::trade("TST", 20080509, 93500, Price(10_20), 100, ""));
///
/// assert_eq!(bars.len(), 2);
/// assert!(bars.is_new_bar());
/// assert_eq!(bars.highest_high(2), Some(Price(10_50)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct BarList {
    interval: BarInterval,
    bars: Vec<Bar>,
    new_bar: bool,
}

impl BarList {
    pub fn new(interval: BarInterval) -> Self {
        Self {
            interval,
            bars: Vec::new(),
            new_bar: false,
        }
    }

    #[inline]
    pub fn interval(&self) -> BarInterval {
        self.interval
    }

    /// Fold a tick into the current bar, opening a new one when the tick
    /// falls in a later bucket. Quote-only ticks are ignored.
    pub fn add_tick(&mut self, tick: &Tick) {
        if !tick.is_trade {
            return;
        }
        let start = self.interval.bar_start(tick.time);
        match self.bars.last_mut() {
            Some(bar) if bar.date == tick.date && bar.time == start => {
                bar.update(tick.price, tick.size);
                self.new_bar = false;
            }
            _ => {
                self.bars
                    .push(Bar::open_at(tick.date, start, tick.price, tick.size));
                self.new_bar = true;
            }
        }
    }

    /// Whether the last trade opened a bar.
    #[inline]
    pub fn is_new_bar(&self) -> bool {
        self.new_bar
    }

    /// At least `n` bars exist.
    #[inline]
    pub fn has(&self, n: usize) -> bool {
        self.bars.len() >= n
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The bar currently building.
    #[inline]
    pub fn recent(&self) -> Option<&Bar> {
        self.bars.last()
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Highest high over the last `n` bars (all bars if fewer exist).
    pub fn highest_high(&self, n: usize) -> Option<Price> {
        self.last(n).iter().map(|b| b.high).max()
    }

    /// Lowest low over the last `n` bars (all bars if fewer exist).
    pub fn lowest_low(&self, n: usize) -> Option<Price> {
        self.last(n).iter().map(|b| b.low).min()
    }

    fn last(&self, n: usize) -> &[Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }
}
