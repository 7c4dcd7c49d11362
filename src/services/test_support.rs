//! In-memory collaborators for service tests

use crate::error::{AppError, Result};
use crate::notifications::Notifier;
use crate::quotes::PriceSource;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Price source answering from a fixed quote map
pub struct FakePrices {
    quotes: HashMap<String, String>,
    calls: AtomicUsize,
    closed: Arc<AtomicBool>,
}

impl FakePrices {
    pub fn new(quotes: &[(&str, &str)]) -> Self {
        Self {
            quotes: quotes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

#[async_trait]
impl PriceSource for FakePrices {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_price(&self, symbol: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| AppError::PriceUnavailable(format!("no quote for {}", symbol)))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Notifier that records delivered messages, or fails every send
pub struct FakeNotifier {
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn send(&self, message: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Notify("transport down".to_string()));
        }
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}
