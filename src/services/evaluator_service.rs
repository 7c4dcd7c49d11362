//! Evaluator Service
//!
//! Per-row state machine for the watch-list. For each row, in stored order:
//!
//! 1. Validity gate: rows with an empty or malformed `Ticker`, `Cross` or
//!    `Goal` are skipped and left byte-for-byte untouched.
//! 2. Price fetch: the price source is asked for the ticker; a failed fetch
//!    or unparseable text keeps the stored `Last` value.
//! 3. Status: recomputed from scratch every run from the compared price,
//!    the goal and the direction (see [`ComparisonPolicy`]).
//! 4. Notification: one alert when the status is `OK` and `Notify` is
//!    empty; `Notify` becomes `Sent` only after a successful send.
//! 5. `Last Update` is stamped for every evaluated row.
//!
//! Row-level failures are returned as [`RowOutcome`] values and never
//! abort the batch.

use crate::clock::Clock;
use crate::db::models::{CrossDirection, NotifyState, SkipReason, WatchRow, WatchStatus};
use crate::db::{Record, Table};
use crate::error::AppError;
use crate::notifications::{self, Notifier};
use crate::quotes::{parse_price, PriceSource};
use tracing::{info, warn};

/// Which price the status is computed from
///
/// `PreviousPrice` compares the `Last` value stored before this run and
/// only persists the fresh price for the next run, so a crossing is
/// reported one run after it happens. `FetchedPrice` compares the price
/// fetched in this run, falling back to the stored one if the fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonPolicy {
    PreviousPrice,
    FetchedPrice,
}

impl ComparisonPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "previous" => Some(Self::PreviousPrice),
            "fetched" => Some(Self::FetchedPrice),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPolicy::PreviousPrice => "previous",
            ComparisonPolicy::FetchedPrice => "fetched",
        }
    }
}

/// Result of the price fetch for one row
#[derive(Debug, Clone, PartialEq)]
pub enum PriceUpdate {
    Updated(f64),
    FetchFailed(String),
}

/// Result of the notification gate for one row
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// Status is not `OK`
    NotDue,
    /// Status is `OK` but the row was already notified
    AlreadySent,
    Sent,
    /// Transport failed; `Notify` stays empty so the next run retries
    Failed(String),
}

/// Outcome of evaluating one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Skipped {
        row: usize,
        reason: SkipReason,
    },
    Evaluated {
        row: usize,
        ticker: String,
        status: WatchStatus,
        price: PriceUpdate,
        notification: NotificationOutcome,
    },
}

impl RowOutcome {
    /// Log-worthy description of anything that went wrong on this row
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            RowOutcome::Skipped { row, reason } => Some(format!("Row {}: skipped, {}", row, reason)),
            RowOutcome::Evaluated {
                ticker,
                price,
                notification,
                ..
            } => {
                let mut problems = Vec::new();
                if let PriceUpdate::FetchFailed(err) = price {
                    problems.push(format!("price fetch failed, last price kept ({})", err));
                }
                if let NotificationOutcome::Failed(err) = notification {
                    problems.push(format!("alert not sent, will retry next run ({})", err));
                }
                if problems.is_empty() {
                    None
                } else {
                    Some(format!("{}: {}", ticker, problems.join("; ")))
                }
            }
        }
    }
}

/// Status for a price against a goal in the given direction
///
/// `down` is reached at or below the goal, `up` at or above it. Without a
/// price the goal counts as not reached.
pub fn derive_status(direction: CrossDirection, price: Option<f64>, goal: f64) -> WatchStatus {
    let Some(price) = price else {
        return WatchStatus::NotYet;
    };

    let reached = match direction {
        CrossDirection::Down => price <= goal,
        CrossDirection::Up => price >= goal,
    };

    if reached {
        WatchStatus::Ok
    } else {
        WatchStatus::NotYet
    }
}

/// Evaluates watch-list rows against one price source and one notifier
pub struct WatchEvaluator<'a> {
    prices: &'a dyn PriceSource,
    notifier: &'a dyn Notifier,
    policy: ComparisonPolicy,
    clock: Clock,
}

impl<'a> WatchEvaluator<'a> {
    pub fn new(
        prices: &'a dyn PriceSource,
        notifier: &'a dyn Notifier,
        policy: ComparisonPolicy,
        clock: Clock,
    ) -> Self {
        Self {
            prices,
            notifier,
            policy,
            clock,
        }
    }

    /// Evaluate every row of the table in order, one at a time
    pub async fn evaluate_table(&self, table: &mut Table) -> Vec<RowOutcome> {
        let mut outcomes = Vec::with_capacity(table.len());
        for (idx, record) in table.rows.iter_mut().enumerate() {
            outcomes.push(self.evaluate_record(idx + 1, record).await);
        }
        outcomes
    }

    /// Evaluate a single stored row, updating it in place
    pub async fn evaluate_record(&self, row_number: usize, record: &mut Record) -> RowOutcome {
        let mut row = match WatchRow::from_record(record) {
            Ok(row) => row,
            Err(reason) => {
                warn!("Row {}: skipped, {}", row_number, reason);
                return RowOutcome::Skipped {
                    row: row_number,
                    reason,
                };
            }
        };

        let stored_price = row.last_price;
        let price = self.fetch(&row.ticker).await;
        if let PriceUpdate::Updated(fresh) = price {
            row.last_price = Some(fresh);
        }
        row.last_update = Some(self.clock.now_stamp());

        let compared = match self.policy {
            ComparisonPolicy::PreviousPrice => stored_price,
            ComparisonPolicy::FetchedPrice => row.last_price,
        };
        row.status = derive_status(row.cross_direction, compared, row.goal_price);

        let notification = self.notify_if_due(&mut row, compared).await;

        row.apply_to(record);

        RowOutcome::Evaluated {
            row: row_number,
            ticker: row.ticker,
            status: row.status,
            price,
            notification,
        }
    }

    async fn fetch(&self, ticker: &str) -> PriceUpdate {
        let result = self.prices.fetch_price(ticker).await.and_then(|raw| {
            parse_price(&raw).ok_or_else(|| {
                AppError::PriceUnavailable(format!("'{}' is not a price", raw.trim()))
            })
        });

        match result {
            Ok(price) => {
                info!("{}: {}", ticker, price);
                PriceUpdate::Updated(price)
            }
            Err(e) => {
                warn!("{}: price fetch failed: {}", ticker, e);
                PriceUpdate::FetchFailed(e.to_string())
            }
        }
    }

    async fn notify_if_due(&self, row: &mut WatchRow, compared: Option<f64>) -> NotificationOutcome {
        if row.status != WatchStatus::Ok {
            return NotificationOutcome::NotDue;
        }
        if row.notify_state == NotifyState::Sent {
            return NotificationOutcome::AlreadySent;
        }

        // An OK status always comes from a concrete price.
        let price = compared.unwrap_or(row.goal_price);
        let message =
            notifications::crossing_message(&row.ticker, row.goal_price, row.cross_direction, price);
        info!("Sending alert: {}", message);

        match self.notifier.send(&message).await {
            Ok(()) => {
                row.notify_state = NotifyState::Sent;
                NotificationOutcome::Sent
            }
            Err(e) => {
                warn!("{}: alert failed: {}", row.ticker, e);
                let error = e.to_string();
                notifications::notify_best_effort(
                    self.notifier,
                    &notifications::alert_failed_message(&row.ticker, &error),
                )
                .await;
                NotificationOutcome::Failed(error)
            }
        }
    }
}
