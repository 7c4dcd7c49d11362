//! `init` command: workbook setup

use crate::config::Config;
use crate::db::SqliteWorkbook;
use crate::error::Result;
use crate::security::{KeychainManager, TELEGRAM_TOKEN_ENTRY};

/// Create the workbook with empty watch-list and log sheets
///
/// Existing sheets and rows are left alone. A bot token present in the
/// environment is copied to the OS keychain so later runs can drop it.
pub fn init_workbook(config: &Config) -> Result<SqliteWorkbook> {
    let workbook = SqliteWorkbook::create(
        &config.workbook_path,
        &config.stocks_sheet,
        &config.logs_sheet,
    )?;
    tracing::info!("Workbook ready at {}", workbook.path().display());

    if let Some(ref token) = config.telegram_token {
        if let Err(e) = KeychainManager::new().store_secret(TELEGRAM_TOKEN_ENTRY, token) {
            tracing::warn!("Could not store the bot token in the keychain: {}", e);
        }
    }

    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{LOG_COLUMNS, REQUIRED_COLUMNS};
    use crate::db::TabularStore;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_sheets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("watch.db");
        let config = Config::from_lookup(|key| match key {
            "WORKBOOK_PATH" => Some(path.display().to_string()),
            _ => None,
        })
        .unwrap();

        let workbook = init_workbook(&config).unwrap();

        let stocks = workbook.read_table("Stocks").unwrap();
        assert_eq!(stocks.headers, REQUIRED_COLUMNS);
        assert!(stocks.is_empty());
        let logs = workbook.read_table("Logs").unwrap();
        assert_eq!(logs.headers, LOG_COLUMNS);

        // Running it again keeps the workbook usable
        drop(workbook);
        assert!(init_workbook(&config).is_ok());
    }
}
