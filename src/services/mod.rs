//! Services Layer
//!
//! Business logic for a watch run. Commands wire the concrete store,
//! quote source and notifier together; services only see the traits.
//!
//! # Architecture
//!
//! ```text
//! CLI verb --> Commands --> WatchService ──┬──> SchemaService
//!                                          ├──> EvaluatorService --> PriceSource / Notifier
//!                                          └──> TabularStore (watch-list + audit log)
//! ```
//!
//! # Services
//!
//! - `WatchService` - Pre-flight lock check, batch run, audit log
//! - `EvaluatorService` - Per-row crossing evaluation and one-shot alerts
//! - `SchemaService` - Required column reconciliation

pub mod evaluator_service;
pub mod schema_service;
pub mod watch_service;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types and services
pub use evaluator_service::{
    derive_status, ComparisonPolicy, NotificationOutcome, PriceUpdate, RowOutcome, WatchEvaluator,
};
pub use schema_service::reconcile_schema;
pub use watch_service::{BatchReport, RunCounts, WatchService};
