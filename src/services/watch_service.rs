//! Watch Service
//!
//! Batch orchestration for one run: pre-flight lock check, schema
//! reconciliation, row evaluation, write-back of the watch-list and the
//! audit log entries. Only store access can fail a run; everything that
//! goes wrong on a single row ends up in the [`BatchReport`].

use crate::clock::Clock;
use crate::config::Config;
use crate::db::logs;
use crate::db::models::{LogEntry, REQUIRED_COLUMNS};
use crate::db::TabularStore;
use crate::error::{AppError, Result};
use crate::notifications::{self, Notifier};
use crate::quotes::PriceSource;
use crate::services::evaluator_service::{
    NotificationOutcome, PriceUpdate, RowOutcome, WatchEvaluator,
};
use crate::services::schema_service::reconcile_schema;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// Per-run tallies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub rows: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub fetch_failures: usize,
    pub alerts_sent: usize,
    pub alert_failures: usize,
}

/// Everything that happened during one run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: String,
    pub missing_columns: Vec<String>,
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    /// Warnings and row diagnostics, in the order they happened
    pub fn diagnostics(&self) -> Vec<String> {
        let mut diagnostics = Vec::new();
        if !self.missing_columns.is_empty() {
            diagnostics.push(format!(
                "Missing columns: {}",
                self.missing_columns.join(", ")
            ));
        }
        diagnostics.extend(self.outcomes.iter().filter_map(RowOutcome::diagnostic));
        diagnostics
    }

    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts {
            rows: self.outcomes.len(),
            ..Default::default()
        };

        for outcome in &self.outcomes {
            match outcome {
                RowOutcome::Skipped { .. } => counts.skipped += 1,
                RowOutcome::Evaluated {
                    price,
                    notification,
                    ..
                } => {
                    counts.evaluated += 1;
                    if matches!(price, PriceUpdate::FetchFailed(_)) {
                        counts.fetch_failures += 1;
                    }
                    match notification {
                        NotificationOutcome::Sent => counts.alerts_sent += 1,
                        NotificationOutcome::Failed(_) => counts.alert_failures += 1,
                        _ => {}
                    }
                }
            }
        }

        counts
    }

    /// One-line run summary for the audit log
    pub fn summary(&self) -> String {
        let c = self.counts();
        format!(
            "Run {} finished: {} rows, {} evaluated, {} skipped, {} fetch failures, {} alerts sent, {} alert failures, {} warnings",
            self.run_id,
            c.rows,
            c.evaluated,
            c.skipped,
            c.fetch_failures,
            c.alerts_sent,
            c.alert_failures,
            self.diagnostics().len()
        )
    }
}

/// Runs the watch-list against a store and a notifier
pub struct WatchService<'a> {
    config: &'a Config,
    store: &'a dyn TabularStore,
    notifier: &'a dyn Notifier,
    clock: Clock,
}

impl<'a> WatchService<'a> {
    pub fn new(config: &'a Config, store: &'a dyn TabularStore, notifier: &'a dyn Notifier) -> Self {
        Self {
            config,
            store,
            notifier,
            clock: Clock::new(config.timezone),
        }
    }

    /// Refuse to start while another process holds the workbook
    pub async fn preflight(&self) -> Result<()> {
        match self.store.ensure_unlocked() {
            Ok(()) => Ok(()),
            Err(e @ AppError::StoreLocked(_)) => {
                error!("{}", e);
                notifications::notify_best_effort(self.notifier, &notifications::locked_message())
                    .await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Evaluate the whole watch-list once and persist the results
    pub async fn run(&self, prices: &dyn PriceSource) -> Result<BatchReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        self.run_batch(run_id, prices).instrument(span).await
    }

    async fn run_batch(&self, run_id: Uuid, prices: &dyn PriceSource) -> Result<BatchReport> {
        let started_at = self.clock.now_stamp();
        info!(
            "Starting run on sheet '{}' (comparison: {})",
            self.config.stocks_sheet,
            self.config.comparison.as_str()
        );

        let mut table = self.store.read_table(&self.config.stocks_sheet)?;
        info!("Loaded {} rows", table.len());

        let missing_columns = reconcile_schema(&mut table, REQUIRED_COLUMNS);
        if !missing_columns.is_empty() {
            notifications::notify_best_effort(
                self.notifier,
                &notifications::missing_columns_message(&missing_columns),
            )
            .await;
        }

        let evaluator =
            WatchEvaluator::new(prices, self.notifier, self.config.comparison, self.clock);
        let outcomes = evaluator.evaluate_table(&mut table).await;

        self.store.replace_table(&self.config.stocks_sheet, &table)?;

        let report = BatchReport {
            run_id,
            started_at,
            missing_columns,
            outcomes,
        };

        self.write_audit(&report)?;
        info!("{}", report.summary());

        Ok(report)
    }

    /// Append one entry per diagnostic plus the run summary to the log sheet
    fn write_audit(&self, report: &BatchReport) -> Result<()> {
        let now = self.clock.now_stamp();
        let mut entries: Vec<LogEntry> = report
            .diagnostics()
            .into_iter()
            .map(|message| LogEntry::new(now.clone(), message))
            .collect();
        entries.push(LogEntry::new(now, report.summary()));

        logs::append_log(self.store, &self.config.logs_sheet, &entries)?;
        Ok(())
    }

    /// Record a fatal error in the log sheet and tell the operator
    pub async fn report_fatal(&self, error: &AppError) {
        let message = notifications::fatal_message(&error.to_string());
        error!("{}", message);

        if !matches!(error, AppError::StoreLocked(_)) {
            let entry = LogEntry::new(self.clock.now_stamp(), message.clone());
            if let Err(e) = logs::append_log(self.store, &self.config.logs_sheet, &[entry]) {
                error!("Could not record failure in the log sheet: {}", e);
            }
        }

        notifications::notify_best_effort(self.notifier, &message).await;
    }
}
