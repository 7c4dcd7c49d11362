//! Yahoo Finance quote page adapter
//!
//! Loads `https://finance.yahoo.com/quote/<SYMBOL>` and reads the text of the
//! headline price element. The page is polled until the element shows up
//! or the configured wait runs out.

use crate::error::{AppError, Result};
use crate::quotes::PriceSource;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use scraper::{Html, Selector};
use std::time::Duration;

/// Browser User-Agent strings, one picked per session
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Yahoo Finance price source
pub struct YahooQuoteSource {
    client: reqwest::Client,
    base_url: String,
    wait: Duration,
    poll_interval: Duration,
}

impl YahooQuoteSource {
    /// Create a source that waits at most `wait` for each price
    pub fn new(base_url: &str, wait: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(random_user_agent())
            .timeout(wait)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            wait,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!("{}{}", self.base_url, urlencoding::encode(symbol))
    }

    async fn load_page(&self, symbol: &str) -> Result<String> {
        let response = self
            .client
            .get(self.quote_url(symbol))
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    async fn poll_until_present(&self, symbol: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let html = self.load_page(symbol).await?;
            if let Some(price) = extract_price(&html, symbol)? {
                tracing::debug!("{}: price element found on attempt {}", symbol, attempt);
                return Ok(price);
            }
            tracing::trace!("{}: price element not present yet", symbol);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl PriceSource for YahooQuoteSource {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<String> {
        match tokio::time::timeout(self.wait, self.poll_until_present(symbol)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::PriceUnavailable(format!(
                "{}: price did not appear within {}s",
                symbol,
                self.wait.as_secs()
            ))),
        }
    }
}

/// Pull the headline price text for `symbol` out of a quote page
pub(crate) fn extract_price(html: &str, symbol: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let escaped = symbol.replace('\\', "\\\\").replace('"', "\\\"");

    let selectors = [
        format!(
            "fin-streamer[data-symbol=\"{}\"][data-test=\"qsp-price\"]",
            escaped
        ),
        "[data-testid=\"qsp-price\"]".to_string(),
    ];

    for raw in &selectors {
        let selector = Selector::parse(raw)
            .map_err(|e| AppError::Internal(format!("invalid price selector {}: {:?}", raw, e)))?;

        if let Some(element) = document.select(&selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }

    Ok(None)
}

fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}
