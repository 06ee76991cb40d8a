//! Channel breakout: the demo strategy the runner trades.

use gauntlet::{BarList, Decision, Position, Price, Strategy, Tick};

use crate::config::StrategyConfig;

/// Enters when a print leaves the high/low channel of the last `lookback`
/// finished bars; exits on a per-share profit target or stop loss.
#[derive(Debug, Clone)]
pub struct Breakout {
    config: StrategyConfig,
    profit_target: i64,
    stop_loss: i64,
}

impl Breakout {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            profit_target: to_cents(config.profit_target),
            stop_loss: to_cents(config.stop_loss),
            config,
        }
    }

    /// High and low of the finished bars in the lookback window.
    fn channel(&self, bars: &BarList) -> Option<(Price, Price)> {
        let all = bars.bars();
        let finished = &all[..all.len().saturating_sub(1)];
        let window = &finished[finished.len().saturating_sub(self.config.lookback)..];
        let high = window.iter().map(|b| b.high).max()?;
        let low = window.iter().map(|b| b.low).min()?;
        Some((high, low))
    }
}

fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

impl Strategy for Breakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn indicator_names(&self) -> Vec<String> {
        vec!["channel_high".into(), "channel_low".into()]
    }

    fn evaluate(
        &mut self,
        tick: &Tick,
        bars: &BarList,
        position: &Position,
    ) -> anyhow::Result<Decision> {
        if !bars.has(self.config.lookback + 1) {
            return Ok(Decision::hold());
        }
        let Some((high, low)) = self.channel(bars) else {
            return Ok(Decision::hold());
        };
        let indicators = vec![high.0 as f64 / 100.0, low.0 as f64 / 100.0];
        let size = self.config.size as i64;

        let decision = if position.is_flat() {
            if tick.price > high {
                Decision::target(size)
            } else if tick.price < low {
                Decision::target(-size)
            } else {
                Decision::hold()
            }
        } else {
            let per_share = position.unrealized_pnl(tick.price) / position.size().abs();
            if per_share >= self.profit_target || per_share <= -self.stop_loss {
                Decision::flat()
            } else {
                Decision::hold()
            }
        };
        Ok(decision.with_indicators(indicators))
    }
}
