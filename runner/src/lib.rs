//! Command-line backtests: TOML config, CSV tick files, a channel breakout
//! strategy and a text or JSON summary.

pub mod config;
pub mod error;
pub mod execution;
pub mod report;
pub mod strategy;
pub mod ticks;
