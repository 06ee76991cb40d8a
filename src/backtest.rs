//! Tick replay driver: feeds sources through a broker and a strategy on a
//! worker thread.
//!
//! For every tick, in caller source order and each source's native order:
//!
//! 1. ticks from other exchanges are dropped when a filter is set
//! 2. the symbol's bars are updated
//! 3. the broker fills whatever the tick allows
//! 4. quote-only ticks stop here
//! 5. the strategy evaluates the tick
//! 6. a market order for the difference between the target and the current
//!    exposure is sent
//!
//! Because step 3 runs before step 6, an order can never fill on the tick
//! that produced it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::account::DEFAULT_ACCOUNT_ID;
use crate::{Account, BarInterval, BarList, Broker, Order, Position, Strategy, Symbol, Tick};

/// A named, ordered stream of ticks.
pub struct TickSource {
    pub name: String,
    ticks: Box<dyn Iterator<Item = Tick> + Send>,
}

impl TickSource {
    pub fn new<I>(name: impl Into<String>, ticks: I) -> Self
    where
        I: IntoIterator<Item = Tick>,
        I::IntoIter: Send + 'static,
    {
        Self {
            name: name.into(),
            ticks: Box::new(ticks.into_iter()),
        }
    }

    /// Number of ticks, when the iterator knows it exactly.
    fn exact_len(&self) -> Option<usize> {
        match self.ticks.size_hint() {
            (lo, Some(hi)) if lo == hi => Some(lo),
            _ => None,
        }
    }
}

impl From<Vec<Tick>> for TickSource {
    fn from(ticks: Vec<Tick>) -> Self {
        Self::new("ticks", ticks)
    }
}

impl fmt::Debug for TickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickSource").field("name", &self.name).finish()
    }
}

fn default_progress_step() -> u8 {
    5
}

fn default_account() -> String {
    DEFAULT_ACCOUNT_ID.to_string()
}

/// Run settings. Immutable once the run starts.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct BacktestConfig {
    /// Label for logs and the report
    pub name: String,
    /// Only ticks from this exchange are replayed; empty means all
    pub exchange_filter: String,
    /// Directory callers write run artifacts to
    pub base_path: PathBuf,
    /// Account the strategy trades in
    pub account: String,
    /// Percent between progress events within one source
    pub progress_step: u8,
    pub bar_interval: BarInterval,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            name: "backtest".to_string(),
            exchange_filter: String::new(),
            base_path: PathBuf::from("."),
            account: default_account(),
            progress_step: default_progress_step(),
            bar_interval: BarInterval::default(),
        }
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    Completed,
    Cancelled,
    Faulted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// Sent from the worker while it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BacktestEvent {
    /// Percent of sources consumed, never decreasing, at most 100
    Progress(u8),
    /// Always the last event of a run
    Finished(RunState),
}

/// Everything a finished or cancelled run accumulated.
#[derive(Debug)]
pub struct BacktestReport {
    pub name: String,
    pub state: RunState,
    /// The broker with every order and fill of the run
    pub broker: Broker,
    pub indicator_names: Vec<String>,
    /// One row per tick on which the strategy reported indicators
    pub indicators: Vec<Vec<f64>>,
    /// Ticks that passed the exchange filter
    pub ticks_processed: usize,
    pub fills: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("backtest has no strategy configured")]
    NotConfigured,
    #[error("failed to spawn backtest worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("strategy {name} failed on {symbol}: {cause}")]
    Strategy {
        name: String,
        symbol: Symbol,
        #[source]
        cause: anyhow::Error,
    },
    #[error("backtest worker panicked")]
    WorkerPanicked,
}

/// A configured, not yet started run.
///
/// ```
/// use gauntlet::{Backtest, BacktestConfig, BarList, Broker, Decision, Position,
///                Price, RunState, Strategy, Tick, TickSource};
///
/// struct BuyOnce;
///
/// impl Strategy for BuyOnce {
///     fn name(&self) -> &str { "buy-once" }
///     fn evaluate(&mut self, _: &Tick, _: &BarList, _: &Position)
///         -> anyhow::Result<gauntlet::Decision> {
///         Ok(Decision::target(100))
///     }
/// }
///
/// let ticks: Vec<Tick> = (0..3)
///     .map(|i| Tick::trade("TST", 20080509, 93000 + i * 100, Price(10_00), 100, "NYSE"))
///     .collect();
///
/// let mut backtest = Backtest::new(Broker::new());
/// backtest.configure(vec![TickSource::new("TST", ticks)], BuyOnce, BacktestConfig::default());
/// let report = backtest.start().unwrap().wait().unwrap();
///
/// assert_eq!(report.state, RunState::Completed);
/// assert_eq!(report.fills, 1);
/// assert_eq!(report.broker.open_position("TST").size(), 100);
/// ```
pub struct Backtest {
    broker: Broker,
    sources: Vec<TickSource>,
    strategy: Option<Box<dyn Strategy>>,
    config: BacktestConfig,
    cancel: Arc<AtomicBool>,
}

impl Backtest {
    pub fn new(broker: Broker) -> Self {
        Self {
            broker,
            sources: Vec::new(),
            strategy: None,
            config: BacktestConfig::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the sources, strategy and settings, replacing earlier ones.
    pub fn configure<S>(&mut self, sources: Vec<TickSource>, strategy: S, config: BacktestConfig)
    where
        S: Strategy + 'static,
    {
        self.sources = sources;
        self.strategy = Some(Box::new(strategy));
        self.config = config;
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Request cancellation; a run started later stops before its first tick.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Run on a named worker thread.
    pub fn start(self) -> Result<BacktestHandle, BacktestError> {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::clone(&self.cancel);
        let run = self.into_run(Some(tx))?;
        let join = thread::Builder::new()
            .name(format!("backtest-{}", run.config.name))
            .spawn(move || run.execute())
            .map_err(BacktestError::Spawn)?;
        Ok(BacktestHandle {
            cancel,
            events: rx,
            join,
        })
    }

    /// Run on the calling thread.
    pub fn run(self) -> Result<BacktestReport, BacktestError> {
        self.into_run(None)?.execute()
    }

    fn into_run(self, events: Option<Sender<BacktestEvent>>) -> Result<Run, BacktestError> {
        let strategy = self.strategy.ok_or(BacktestError::NotConfigured)?;
        Ok(Run {
            broker: self.broker,
            sources: self.sources,
            strategy,
            account: Account::with_id(self.config.account.clone()),
            config: self.config,
            cancel: self.cancel,
            events,
        })
    }
}

impl fmt::Debug for Backtest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backtest")
            .field("sources", &self.sources)
            .field("configured", &self.strategy.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// Control side of a running backtest.
#[derive(Debug)]
pub struct BacktestHandle {
    cancel: Arc<AtomicBool>,
    events: Receiver<BacktestEvent>,
    join: JoinHandle<Result<BacktestReport, BacktestError>>,
}

impl BacktestHandle {
    /// Ask the worker to stop before its next tick.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Progress and completion events.
    pub fn events(&self) -> &Receiver<BacktestEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the worker ends and hand back its report.
    pub fn wait(self) -> Result<BacktestReport, BacktestError> {
        self.join.join().map_err(|_| BacktestError::WorkerPanicked)?
    }
}

/// State owned by the worker for one run.
struct Run {
    broker: Broker,
    sources: Vec<TickSource>,
    strategy: Box<dyn Strategy>,
    account: Account,
    config: BacktestConfig,
    cancel: Arc<AtomicBool>,
    events: Option<Sender<BacktestEvent>>,
}

impl Run {
    fn execute(mut self) -> Result<BacktestReport, BacktestError> {
        let name = self.config.name.clone();
        let sources = std::mem::take(&mut self.sources);
        info!(
            "backtest {name}: {} sources, strategy {}",
            sources.len(),
            self.strategy.name()
        );

        let mut report = BacktestReport {
            name: name.clone(),
            state: RunState::Completed,
            broker: Broker::new(),
            indicator_names: self.strategy.indicator_names(),
            indicators: Vec::new(),
            ticks_processed: 0,
            fills: 0,
        };
        let mut state = ReplayState::new(self.config.bar_interval);
        state.apply_fills(&self.broker, &self.account);
        let mut progress = Progress::new(sources.len(), self.config.progress_step);

        'sources: for (index, source) in sources.into_iter().enumerate() {
            if self.cancelled() {
                report.state = RunState::Cancelled;
                break;
            }
            let total = source.exact_len();
            debug!("backtest {name}: replaying {}", source.name);
            for (seen, tick) in source.ticks.enumerate() {
                if self.cancelled() {
                    report.state = RunState::Cancelled;
                    break 'sources;
                }
                if let Some(pct) = total.and_then(|n| progress.within(index, seen, n)) {
                    self.send(BacktestEvent::Progress(pct));
                }
                if let Err(e) = self.step(&tick, &mut state, &mut report) {
                    warn!("backtest {name}: {e}");
                    self.send(BacktestEvent::Finished(RunState::Faulted));
                    return Err(e);
                }
            }
            if let Some(pct) = progress.finished(index) {
                self.send(BacktestEvent::Progress(pct));
            }
        }
        if report.state == RunState::Completed {
            if let Some(pct) = progress.complete() {
                self.send(BacktestEvent::Progress(pct));
            }
        }

        info!(
            "backtest {name}: {} after {} ticks, {} fills",
            report.state, report.ticks_processed, report.fills
        );
        self.send(BacktestEvent::Finished(report.state));
        report.broker = self.broker;
        Ok(report)
    }

    fn step(
        &mut self,
        tick: &Tick,
        state: &mut ReplayState,
        report: &mut BacktestReport,
    ) -> Result<(), BacktestError> {
        let filter = &self.config.exchange_filter;
        if !filter.is_empty() && tick.exchange != *filter {
            return Ok(());
        }
        report.ticks_processed += 1;

        let interval = state.interval;
        state
            .bars
            .entry(tick.symbol.clone())
            .or_insert_with(|| BarList::new(interval))
            .add_tick(tick);

        let filled = self.broker.execute(tick);
        if filled > 0 {
            report.fills += filled;
            state.apply_fills(&self.broker, &self.account);
        }
        if !tick.is_trade {
            return Ok(());
        }

        let position = state.position(&tick.symbol);
        let bars = &state.bars[&tick.symbol];
        let decision = self
            .strategy
            .evaluate(tick, bars, &position)
            .map_err(|cause| BacktestError::Strategy {
                name: self.strategy.name().to_string(),
                symbol: tick.symbol.clone(),
                cause,
            })?;
        if let Some(values) = decision.indicators {
            report.indicators.push(values);
        }

        if let Some(target) = decision.target {
            let pending = self
                .broker
                .open_exposure_for(tick.symbol.as_str(), &self.account)
                .unwrap_or(0);
            let diff = target - (position.size() + pending);
            if diff != 0 {
                self.submit(tick, diff);
            }
        }
        Ok(())
    }

    fn submit(&mut self, tick: &Tick, size: i64) {
        match Order::signed(tick.symbol.as_str(), size) {
            Ok(order) => {
                let order = order
                    .at(tick.date, tick.time)
                    .on(tick.exchange.clone())
                    .with_comment(self.strategy.name());
                self.broker.send_order_for(order, &self.account);
            }
            Err(e) => warn!("{}: cannot order {size} {}: {e}", self.config.name, tick.symbol),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn send(&self, event: BacktestEvent) {
        if let Some(tx) = &self.events {
            // Receiver may already be gone
            let _ = tx.send(event);
        }
    }
}

/// Per-symbol bars and positions, updated incrementally from new fills.
#[derive(Debug)]
struct ReplayState {
    interval: BarInterval,
    bars: FxHashMap<Symbol, BarList>,
    positions: FxHashMap<Symbol, Position>,
    trades_seen: usize,
}

impl ReplayState {
    fn new(interval: BarInterval) -> Self {
        Self {
            interval,
            bars: FxHashMap::default(),
            positions: FxHashMap::default(),
            trades_seen: 0,
        }
    }

    fn apply_fills(&mut self, broker: &Broker, account: &Account) {
        let Ok(trades) = broker.trade_list_for(account) else {
            return;
        };
        for trade in &trades[self.trades_seen.min(trades.len())..] {
            self.positions
                .entry(trade.symbol.clone())
                .or_insert_with(|| Position::new(trade.symbol.clone()))
                .adjust(trade);
        }
        self.trades_seen = trades.len();
    }

    fn position(&self, symbol: &Symbol) -> Position {
        self.positions
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Position::new(symbol.clone()))
    }
}

/// Percent-complete bookkeeping; only ever reports increases.
struct Progress {
    sources: usize,
    step: u8,
    last: Option<u8>,
}

impl Progress {
    fn new(sources: usize, step: u8) -> Self {
        Self {
            sources,
            step: step.max(1),
            last: None,
        }
    }

    /// Progress partway through source `index` after `seen` of `total` ticks.
    fn within(&mut self, index: usize, seen: usize, total: usize) -> Option<u8> {
        if total == 0 {
            return None;
        }
        let done = index * total + seen;
        let pct = percent(done, self.sources * total);
        match self.last {
            Some(last) if pct < last.saturating_add(self.step) => None,
            _ => self.advance(pct),
        }
    }

    fn finished(&mut self, index: usize) -> Option<u8> {
        self.advance(percent(index + 1, self.sources))
    }

    fn complete(&mut self) -> Option<u8> {
        self.advance(100)
    }

    fn advance(&mut self, pct: u8) -> Option<u8> {
        if self.last.is_some_and(|last| pct <= last) {
            return None;
        }
        self.last = Some(pct);
        Some(pct)
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100) as u8
}
