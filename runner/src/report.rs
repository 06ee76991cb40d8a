//! End-of-run summary, printable as text or JSON.

use std::fmt;

use gauntlet::{Account, BacktestReport, RunState, Symbol};

use crate::error::Result;
use serde::Serialize;

/// Net position in one symbol at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionLine {
    pub symbol: Symbol,
    pub size: i64,
    /// Average entry price in cents
    pub avg_price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub name: String,
    pub state: RunState,
    pub account: String,
    pub ticks_processed: usize,
    pub fills: usize,
    pub open_orders: usize,
    /// Realized PnL in cents
    pub closed_pl: i64,
    /// Realized per-share points in cents
    pub closed_pt: i64,
    pub positions: Vec<PositionLine>,
    pub indicator_names: Vec<String>,
    /// Last reported indicator values
    pub last_indicators: Option<Vec<f64>>,
}

impl Summary {
    /// Summarize `account` in a finished run.
    ///
    /// Fails if the run's broker never saw the account.
    pub fn from_report(report: &BacktestReport, account: &str) -> Result<Self> {
        let account = Account::with_id(account);
        let broker = &report.broker;

        let trades = broker.trade_list_for(&account)?;
        let mut symbols: Vec<Symbol> = trades.iter().map(|t| t.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        let mut positions = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let pos = broker.open_position_for(symbol.as_str(), &account)?;
            positions.push(PositionLine {
                size: pos.size(),
                avg_price: pos.avg_price().0,
                symbol,
            });
        }

        Ok(Self {
            name: report.name.clone(),
            state: report.state,
            account: account.id.clone(),
            ticks_processed: report.ticks_processed,
            fills: report.fills,
            open_orders: broker.order_list_for(&account)?.len(),
            closed_pl: broker.closed_pl_for(None, &account)?,
            closed_pt: broker.closed_pt_for(None, &account)?,
            positions,
            indicator_names: report.indicator_names.clone(),
            last_indicators: report.indicators.last().cloned(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}{}.{:02}", cents.abs() / 100, cents.abs() % 100)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backtest {} ({})", self.name, self.state)?;
        writeln!(f, "  account:     {}", self.account)?;
        writeln!(f, "  ticks:       {}", self.ticks_processed)?;
        writeln!(f, "  fills:       {}", self.fills)?;
        writeln!(f, "  open orders: {}", self.open_orders)?;
        writeln!(f, "  closed P&L:  {}", dollars(self.closed_pl))?;
        writeln!(f, "  closed pts:  {}", dollars(self.closed_pt))?;
        for p in &self.positions {
            writeln!(f, "  {:<8} {:>8} @ {}", p.symbol, p.size, dollars(p.avg_price))?;
        }
        Ok(())
    }
}
