//! StockChaser - Price Target Watch-List Alerter
//!
//! Reads a watch-list of tickers with price goals from a workbook, refreshes
//! each ticker's last price, marks rows whose goal was crossed and sends a
//! single Telegram alert per crossing.

pub mod clock;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod notifications;
pub mod quotes;
pub mod security;
pub mod services;

use config::Config;
use error::AppError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: stock-chaser [run|init]";

/// Verbs accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Init,
}

impl Command {
    /// Parse the arguments after the program name
    pub fn parse(args: &[String]) -> error::Result<Self> {
        match args {
            [] => Ok(Command::Run),
            [verb] => match verb.as_str() {
                "run" => Ok(Command::Run),
                "init" => Ok(Command::Init),
                other => Err(AppError::Usage(format!("unknown command '{}'; {}", other, USAGE))),
            },
            _ => Err(AppError::Usage(format!("too many arguments; {}", USAGE))),
        }
    }
}

/// Initialize logging and run one CLI verb to completion
pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,stock_chaser_lib=info,stock_chaser=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = Command::parse(&args)?;
    let config = Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    match command {
        Command::Init => {
            commands::init_workbook(&config)?;
        }
        Command::Run => {
            config.validate_for_run()?;
            tracing::info!("Starting StockChaser...");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            let report = runtime.block_on(commands::run_watch(&config)).map_err(|e| {
                tracing::error!(code = e.code(), "Run aborted: {}", e);
                e
            })?;
            tracing::info!("{}", report.summary());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse(&args(&[])).unwrap(), Command::Run);
        assert_eq!(Command::parse(&args(&["run"])).unwrap(), Command::Run);
        assert_eq!(Command::parse(&args(&["init"])).unwrap(), Command::Init);
    }

    #[test]
    fn test_command_parse_rejects_unknown() {
        let err = Command::parse(&args(&["frobnicate"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(Command::parse(&args(&["run", "init"])).is_err());
    }
}
