//! Run configuration
//!
//! Everything the run needs is read once at startup from the environment
//! (optionally seeded from a `.env` file) and validated before any store or
//! network access happens.

use crate::error::{AppError, Result};
use crate::security::{KeychainManager, TELEGRAM_TOKEN_ENTRY};
use crate::services::evaluator_service::ComparisonPolicy;
use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_STOCKS_SHEET: &str = "Stocks";
pub const DEFAULT_LOGS_SHEET: &str = "Logs";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_QUOTE_BASE_URL: &str = "https://finance.yahoo.com/quote/";
pub const DEFAULT_QUOTE_WAIT_SECS: u64 = 10;

const MAX_QUOTE_WAIT_SECS: u64 = 120;

/// Validated configuration passed to the commands
#[derive(Clone)]
pub struct Config {
    pub workbook_path: PathBuf,
    pub stocks_sheet: String,
    pub logs_sheet: String,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
    pub quote_base_url: String,
    pub quote_wait: Duration,
    pub comparison: ComparisonPolicy,
    pub timezone: Option<Tz>,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let workbook_path = get("WORKBOOK_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Config("WORKBOOK_PATH is not set".to_string()))?;

        let quote_wait_secs = match get("QUOTE_WAIT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Config(format!("QUOTE_WAIT_SECS must be a whole number, got '{}'", raw))
            })?,
            None => DEFAULT_QUOTE_WAIT_SECS,
        };

        let comparison = match get("PRICE_COMPARISON") {
            Some(raw) => ComparisonPolicy::parse(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "PRICE_COMPARISON must be 'previous' or 'fetched', got '{}'",
                    raw
                ))
            })?,
            None => ComparisonPolicy::PreviousPrice,
        };

        let timezone = match get("STOCK_CHASER_TZ") {
            Some(raw) => Some(raw.parse::<Tz>().map_err(|_| {
                AppError::Config(format!("STOCK_CHASER_TZ '{}' is not a known time zone", raw))
            })?),
            None => None,
        };

        let config = Self {
            workbook_path,
            stocks_sheet: get("STOCKS_SHEET").unwrap_or_else(|| DEFAULT_STOCKS_SHEET.to_string()),
            logs_sheet: get("LOGS_SHEET").unwrap_or_else(|| DEFAULT_LOGS_SHEET.to_string()),
            telegram_token: get("TELEGRAM_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            quote_base_url: get("QUOTE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_QUOTE_BASE_URL.to_string()),
            quote_wait: Duration::from_secs(quote_wait_secs),
            comparison,
            timezone,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.stocks_sheet.trim().is_empty() || self.logs_sheet.trim().is_empty() {
            return Err(AppError::Config(
                "STOCKS_SHEET and LOGS_SHEET must not be empty".to_string(),
            ));
        }

        if self.stocks_sheet == self.logs_sheet {
            return Err(AppError::Config(format!(
                "STOCKS_SHEET and LOGS_SHEET must differ (both '{}')",
                self.stocks_sheet
            )));
        }

        let wait = self.quote_wait.as_secs();
        if wait == 0 || wait > MAX_QUOTE_WAIT_SECS {
            return Err(AppError::Config(format!(
                "QUOTE_WAIT_SECS must be between 1 and {}, got {}",
                MAX_QUOTE_WAIT_SECS, wait
            )));
        }

        if let Some(ref chat_id) = self.telegram_chat_id {
            if chat_id.trim().is_empty() {
                return Err(AppError::Config("TELEGRAM_CHAT_ID must not be empty".to_string()));
            }
        }

        validate_http_url("TELEGRAM_API_URL", &self.telegram_api_url)?;
        validate_http_url("QUOTE_BASE_URL", &self.quote_base_url)?;

        Ok(())
    }

    /// Checks that only matter for the `run` verb
    ///
    /// `init` never sends messages, so the chat id is required here rather
    /// than in [`Config::validate`].
    pub fn validate_for_run(&self) -> Result<()> {
        if self.telegram_chat_id.is_none() {
            return Err(AppError::Config("TELEGRAM_CHAT_ID is not set".to_string()));
        }
        Ok(())
    }

    /// Chat id and bot token for the notifier
    ///
    /// A token missing from the environment is looked up in the OS keychain.
    pub fn telegram_credentials(&self, keychain: &KeychainManager) -> Result<(String, String)> {
        let chat_id = self
            .telegram_chat_id
            .clone()
            .ok_or_else(|| AppError::Config("TELEGRAM_CHAT_ID is not set".to_string()))?;

        let token = match self.telegram_token.clone() {
            Some(token) => token,
            None => keychain
                .get_secret(TELEGRAM_TOKEN_ENTRY)
                .map_err(|e| {
                    AppError::Config(format!(
                        "TELEGRAM_TOKEN is not set and the keychain is unavailable: {}",
                        e
                    ))
                })?
                .ok_or_else(|| {
                    AppError::Config(
                        "TELEGRAM_TOKEN is not set in the environment or the keychain".to_string(),
                    )
                })?,
        };

        Ok((token, chat_id))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("workbook_path", &self.workbook_path)
            .field("stocks_sheet", &self.stocks_sheet)
            .field("logs_sheet", &self.logs_sheet)
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "<redacted>"))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("quote_base_url", &self.quote_base_url)
            .field("quote_wait", &self.quote_wait)
            .field("comparison", &self.comparison)
            .field("timezone", &self.timezone)
            .finish()
    }
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| AppError::Config(format!("{} '{}' is not a valid URL: {}", name, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Config(format!(
            "{} must use http or https, got '{}'",
            name, other
        ))),
    }
}
