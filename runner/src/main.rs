//! CLI entry point for gauntlet backtests.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::info;

use gauntlet::RunState;
use gauntlet_runner::config::RunConfig;
use gauntlet_runner::error::Error;
use gauntlet_runner::execution;
use gauntlet_runner::report::Summary;

#[derive(Parser)]
#[command(name = "gauntlet")]
#[command(about = "Replay tick files through a simulated broker and strategy")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the backtest and print a summary
    Run {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the config and decode every tick file without trading
    Check,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match RunConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run { json } => run(&config, json),
        Command::Check => check(&config),
    };

    if let Err(e) = result {
        match &e {
            Error::Backtest(gauntlet::BacktestError::Strategy { .. }) => {
                eprintln!("\nFaulted: {e}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn run(config: &RunConfig, json: bool) -> Result<(), Error> {
    let report = execution::run(config, |pct| info!("progress {pct}%"))?;
    let summary = Summary::from_report(&report, &config.backtest.account)?;
    if json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{summary}");
    }
    if report.state != RunState::Completed {
        info!("run ended {}", report.state);
    }
    Ok(())
}

fn check(config: &RunConfig) -> Result<(), Error> {
    for path in config.tick_files() {
        let source = gauntlet_runner::ticks::load(&path)?;
        println!("{}: ok ({})", path.display(), source.name);
    }
    Ok(())
}
