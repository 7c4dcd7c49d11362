//! Telegram Bot API adapter

use crate::error::{AppError, Result};
use crate::notifications::Notifier;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Subset of the Bot API response envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages to one chat through a bot
pub struct TelegramNotifier {
    api_url: String,
    token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, token: &str, chat_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn id(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message,
        });

        // reqwest errors carry the URL, which contains the token
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("telegram request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Notify(format!("telegram response unreadable: {}", e.without_url())))?;

        let parsed: Option<TelegramResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let detail = parsed
                .and_then(|r| r.description)
                .unwrap_or_else(|| status.to_string());
            return Err(AppError::Notify(format!("telegram returned {}: {}", status, detail)));
        }

        match parsed {
            Some(TelegramResponse { ok: true, .. }) => {
                tracing::debug!("Telegram message delivered to chat {}", self.chat_id);
                Ok(())
            }
            Some(TelegramResponse { description, .. }) => Err(AppError::Notify(format!(
                "telegram rejected message: {}",
                description.unwrap_or_else(|| "unknown reason".to_string())
            ))),
            None => Err(AppError::Notify("telegram response was not JSON".to_string())),
        }
    }
}
