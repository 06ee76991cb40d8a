//! Error types for the runner.

use std::path::PathBuf;

/// All errors that can occur while running a backtest from the command line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read tick file {path}: {source}")]
    TicksRead { path: PathBuf, source: csv::Error },

    #[error("{path} line {line}: {message}")]
    Tick {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error(transparent)]
    Backtest(#[from] gauntlet::BacktestError),

    #[error("cannot summarize run: {0}")]
    Account(#[from] gauntlet::LookupError),

    #[error("failed to write summary: {0}")]
    Summary(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
