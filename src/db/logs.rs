//! Audit Log Sheet
//!
//! Appends run diagnostics to the `Logs` sheet with read-merge-write so
//! earlier entries and any extra columns the user added survive.

use crate::db::models::{LogEntry, LOG_COLUMNS, LOG_MESSAGE, LOG_TIME};
use crate::db::{Cell, Record, Table, TabularStore};
use crate::error::Result;

/// Append entries to a log sheet, creating it when missing
pub fn append_log(store: &dyn TabularStore, sheet: &str, entries: &[LogEntry]) -> Result<usize> {
    if entries.is_empty() {
        return Ok(0);
    }

    let mut table = if store.has_table(sheet)? {
        store.read_table(sheet)?
    } else {
        tracing::info!("Log sheet '{}' missing, creating it", sheet);
        Table::new(LOG_COLUMNS.iter().copied())
    };

    for column in LOG_COLUMNS {
        table.ensure_column(column);
    }

    for entry in entries {
        table.push(
            Record::new()
                .with(LOG_TIME, Cell::text(entry.time.clone()))
                .with(LOG_MESSAGE, Cell::text(entry.message.clone())),
        );
    }

    store.replace_table(sheet, &table)?;
    Ok(entries.len())
}

/// Read back the log sheet as entries, oldest first
pub fn read_log(store: &dyn TabularStore, sheet: &str) -> Result<Vec<LogEntry>> {
    let table = store.read_table(sheet)?;
    Ok(table
        .rows
        .iter()
        .map(|row| LogEntry::new(row.get(LOG_TIME).to_string(), row.get(LOG_MESSAGE).to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteWorkbook;
    use rusqlite::Connection;
    use tempfile::tempdir;

    #[test]
    fn test_append_creates_missing_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watch.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE \"Stocks\" (\"Ticker\");")
            .unwrap();
        let workbook = SqliteWorkbook::open(&path).unwrap();

        let written = append_log(
            &workbook,
            "Logs",
            &[LogEntry::new("2024-01-02 09:30:00", "first")],
        )
        .unwrap();

        assert_eq!(written, 1);
        let entries = read_log(&workbook, "Logs").unwrap();
        assert_eq!(entries, vec![LogEntry::new("2024-01-02 09:30:00", "first")]);
    }

    #[test]
    fn test_append_preserves_history_and_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watch.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE \"Logs\" (\"Time\", \"Log\", \"Reviewed\");
             INSERT INTO \"Logs\" VALUES ('2024-01-01 00:00:00', 'old', 'yes');",
        )
        .unwrap();
        drop(conn);
        let workbook = SqliteWorkbook::open(&path).unwrap();

        append_log(
            &workbook,
            "Logs",
            &[
                LogEntry::new("2024-01-02 09:30:00", "a"),
                LogEntry::new("2024-01-02 09:30:01", "b"),
            ],
        )
        .unwrap();

        let table = workbook.read_table("Logs").unwrap();
        assert_eq!(table.headers, vec!["Time", "Log", "Reviewed"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].get("Reviewed"), &Cell::text("yes"));
        assert_eq!(table.rows[0].get("Log"), &Cell::text("old"));
        assert_eq!(table.rows[2].get("Log"), &Cell::text("b"));
    }

    #[test]
    fn test_append_nothing_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watch.db");
        let workbook = SqliteWorkbook::create(&path, "Stocks", "Logs").unwrap();

        assert_eq!(append_log(&workbook, "Logs", &[]).unwrap(), 0);
        assert!(read_log(&workbook, "Logs").unwrap().is_empty());
    }
}
