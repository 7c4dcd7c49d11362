//! Price-fetch adapters
//!
//! A [`PriceSource`] turns a ticker into the raw price text shown by the
//! quote provider. One source is opened per run and shared by every row
//! through a [`QuoteSession`], which releases it on drop.

pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;

pub use yahoo::YahooQuoteSource;

/// Price source trait that all quote providers implement
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider ID (e.g., "yahoo")
    fn id(&self) -> &'static str;

    /// Fetch the raw price text for a ticker
    async fn fetch_price(&self, symbol: &str) -> Result<String>;

    /// Release provider resources
    fn close(&self) {}
}

/// Scoped price source, closed when the session goes out of scope
pub struct QuoteSession {
    source: Box<dyn PriceSource>,
}

impl QuoteSession {
    pub fn open(source: Box<dyn PriceSource>) -> Self {
        tracing::info!("Quote session opened ({})", source.id());
        Self { source }
    }

    pub fn source(&self) -> &dyn PriceSource {
        self.source.as_ref()
    }
}

impl Drop for QuoteSession {
    fn drop(&mut self) {
        self.source.close();
        tracing::info!("Quote session closed ({})", self.source.id());
    }
}

/// Normalize provider price text into a number
///
/// Grouping commas are stripped before parsing, so `"1,234.50"` reads as
/// `1234.5`. Empty, non-numeric and non-finite text yields `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
