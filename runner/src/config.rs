//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use gauntlet::BacktestConfig;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub backtest: BacktestConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Tick files, replayed in this order; relative paths resolve against
    /// `backtest.base_path`
    pub files: Vec<PathBuf>,
}

/// Parameters of the channel breakout strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    #[serde(default = "default_size")]
    pub size: u64,
    /// Exit once the open trade is up this much per share
    #[serde(default = "default_profit_target")]
    pub profit_target: f64,
    /// Exit once the open trade is down this much per share
    #[serde(default = "default_stop_loss")]
    pub stop_loss: f64,
}

fn default_lookback() -> usize {
    3
}
fn default_size() -> u64 {
    100
}
fn default_profit_target() -> f64 {
    0.20
}
fn default_stop_loss() -> f64 {
    0.11
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            size: default_size(),
            profit_target: default_profit_target(),
            stop_loss: default_stop_loss(),
        }
    }
}

impl RunConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: RunConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        if self.data.files.is_empty() {
            return Err(Error::Config("data.files must list at least one tick file".into()));
        }
        if self.backtest.account.trim().is_empty() {
            return Err(Error::Config("account must not be empty".into()));
        }
        if !(1..=100).contains(&self.backtest.progress_step) {
            return Err(Error::Config("progress_step must be in [1, 100]".into()));
        }
        if self.strategy.lookback == 0 {
            return Err(Error::Config("lookback must be > 0".into()));
        }
        if self.strategy.size == 0 {
            return Err(Error::Config("size must be > 0".into()));
        }
        if self.strategy.profit_target <= 0.0 || self.strategy.stop_loss <= 0.0 {
            return Err(Error::Config(
                "profit_target and stop_loss must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Tick files with relative paths resolved.
    pub fn tick_files(&self) -> Vec<PathBuf> {
        self.data
            .files
            .iter()
            .map(|f| self.backtest.base_path.join(f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet::BarInterval;

    fn example_toml() -> &'static str {
        r#"
[backtest]
name = "ibm-breakout"
exchange_filter = "NYSE"
base_path = "/data/ticks"
account = "SIM"
progress_step = 10
bar_interval = "Minute"

[data]
files = ["IBM-20080509.csv", "/abs/IBM-20080512.csv"]

[strategy]
lookback = 5
size = 200
profit_target = 0.5
stop_loss = 0.25
"#
    }

    #[test]
    fn parse_example_config() {
        let config: RunConfig = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.backtest.name, "ibm-breakout");
        assert_eq!(config.backtest.exchange_filter, "NYSE");
        assert_eq!(config.backtest.account, "SIM");
        assert_eq!(config.backtest.bar_interval, BarInterval::Minute);
        assert_eq!(config.strategy.lookback, 5);
        assert_eq!(config.strategy.size, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: RunConfig = toml::from_str("[data]\nfiles = [\"a.csv\"]\n").unwrap();
        assert_eq!(config.backtest, BacktestConfig::default());
        assert_eq!(config.strategy, StrategyConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tick_files_resolve_against_base_path() {
        let config: RunConfig = toml::from_str(example_toml()).unwrap();
        let files = config.tick_files();
        assert_eq!(files[0], PathBuf::from("/data/ticks/IBM-20080509.csv"));
        assert_eq!(files[1], PathBuf::from("/abs/IBM-20080512.csv"));
    }

    #[test]
    fn validate_catches_empty_files() {
        let mut config: RunConfig = toml::from_str(example_toml()).unwrap();
        config.data.files.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_bad_progress_step() {
        let mut config: RunConfig = toml::from_str(example_toml()).unwrap();
        config.backtest.progress_step = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_lookback() {
        let mut config: RunConfig = toml::from_str(example_toml()).unwrap();
        config.strategy.lookback = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_missing_file() {
        let err = RunConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
