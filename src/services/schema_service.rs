//! Schema Service
//!
//! Makes sure the watch-list carries every column the evaluator reads or
//! writes. Missing columns are added with empty values; nothing is ever
//! renamed or removed, so extra user columns keep working.

use crate::db::Table;

/// Add missing required columns to every row
///
/// Returns the names that were missing, in `required` order. Running it on
/// an already complete table changes nothing and returns an empty list.
pub fn reconcile_schema(table: &mut Table, required: &[&str]) -> Vec<String> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| table.ensure_column(column))
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        tracing::warn!("Missing columns: {}", missing.join(", "));
    }

    missing
}
