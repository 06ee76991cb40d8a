//! Wires config, tick files and the breakout strategy into a backtest.

use gauntlet::{Backtest, BacktestEvent, BacktestReport, Broker, BrokerEvent, TickSource};
use log::{info, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::strategy::Breakout;
use crate::ticks;

/// Load every tick file named by the config, in order.
pub fn load_sources(config: &RunConfig) -> Result<Vec<TickSource>> {
    config.tick_files().iter().map(|p| ticks::load(p)).collect()
}

/// Run the configured backtest on a worker thread, reporting progress as
/// it arrives.
pub fn run<F>(config: &RunConfig, mut on_progress: F) -> Result<BacktestReport>
where
    F: FnMut(u8),
{
    let sources = load_sources(config)?;

    let mut broker = Broker::new();
    broker.subscribe(|event| {
        if let BrokerEvent::Warning(message) = event {
            warn!("broker refused: {message}");
        }
    });

    let mut backtest = Backtest::new(broker);
    backtest.configure(
        sources,
        Breakout::new(config.strategy.clone()),
        config.backtest.clone(),
    );
    let handle = backtest.start()?;

    for event in handle.events() {
        match event {
            BacktestEvent::Progress(pct) => on_progress(pct),
            BacktestEvent::Finished(state) => {
                info!("{} {state}", config.backtest.name);
                break;
            }
        }
    }
    Ok(handle.wait()?)
}
