//! Notification transports
//!
//! Used for crossing alerts and for operational warnings (locked workbook,
//! missing columns, failed alerts, fatal run errors).

pub mod telegram;

use crate::db::models::CrossDirection;
use crate::error::Result;
use async_trait::async_trait;

pub use telegram::TelegramNotifier;

/// Notification channel contract
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable channel identifier (e.g. `telegram`)
    fn id(&self) -> &'static str;

    /// Deliver a plain-text message
    async fn send(&self, message: &str) -> Result<()>;
}

/// Send an operational message, logging instead of failing
pub async fn notify_best_effort(notifier: &dyn Notifier, message: &str) -> bool {
    match notifier.send(message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to send {} notification: {}", notifier.id(), e);
            false
        }
    }
}

// ========== Message Formats ==========

pub fn crossing_message(ticker: &str, goal: f64, direction: CrossDirection, price: f64) -> String {
    format!(
        "#{} reached the goal by crossing {} to {} as last price of {}",
        ticker, goal, direction, price
    )
}

pub fn locked_message() -> String {
    "Workbook is open! StockChaser couldn't start.".to_string()
}

pub fn missing_columns_message(columns: &[String]) -> String {
    format!(
        "Missing columns: {}. Added with empty defaults.",
        columns.join(", ")
    )
}

pub fn alert_failed_message(ticker: &str, error: &str) -> String {
    format!("Failed to send alert for {}: {}", ticker, error)
}

pub fn fatal_message(error: &str) -> String {
    format!("StockChaser run failed: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct DownNotifier;

    #[async_trait]
    impl Notifier for DownNotifier {
        fn id(&self) -> &'static str {
            "down"
        }

        async fn send(&self, _message: &str) -> Result<()> {
            Err(AppError::Notify("unreachable".into()))
        }
    }

    #[test]
    fn test_crossing_message() {
        assert_eq!(
            crossing_message("AAPL", 150.0, CrossDirection::Down, 145.0),
            "#AAPL reached the goal by crossing 150 to down as last price of 145"
        );
        assert_eq!(
            crossing_message("BTC-USD", 70000.5, CrossDirection::Up, 70100.25),
            "#BTC-USD reached the goal by crossing 70000.5 to up as last price of 70100.25"
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let columns = vec!["Status".to_string(), "Notify".to_string()];
        assert_eq!(
            missing_columns_message(&columns),
            "Missing columns: Status, Notify. Added with empty defaults."
        );
    }

    #[tokio::test]
    async fn test_best_effort_swallows_errors() {
        assert!(!notify_best_effort(&DownNotifier, "hello").await);
    }
}
