//! `run` command: one pass over the watch-list

use crate::config::Config;
use crate::db::SqliteWorkbook;
use crate::error::Result;
use crate::notifications::{self, TelegramNotifier};
use crate::quotes::{QuoteSession, YahooQuoteSource};
use crate::security::KeychainManager;
use crate::services::{BatchReport, WatchService};

/// Run the watch-list once against the configured workbook
///
/// Fails only when the workbook cannot be opened, is locked, or cannot be
/// read or written. Every such failure is also reported to the operator.
pub async fn run_watch(config: &Config) -> Result<BatchReport> {
    let (token, chat_id) = config.telegram_credentials(&KeychainManager::new())?;
    let notifier = TelegramNotifier::new(&config.telegram_api_url, &token, &chat_id)?;

    let workbook = match SqliteWorkbook::open(&config.workbook_path) {
        Ok(workbook) => workbook,
        Err(e) => {
            tracing::error!("Cannot open workbook: {}", e);
            notifications::notify_best_effort(
                &notifier,
                &notifications::fatal_message(&e.to_string()),
            )
            .await;
            return Err(e);
        }
    };

    let service = WatchService::new(config, &workbook, &notifier);
    service.preflight().await?;

    let source = YahooQuoteSource::new(&config.quote_base_url, config.quote_wait)?;
    let session = QuoteSession::open(Box::new(source));

    match service.run(session.source()).await {
        Ok(report) => Ok(report),
        Err(e) => {
            service.report_fatal(&e).await;
            Err(e)
        }
    }
}
