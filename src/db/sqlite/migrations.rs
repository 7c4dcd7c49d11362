//! Workbook initialization

use super::tables;
use crate::db::models::{LOG_COLUMNS, REQUIRED_COLUMNS};
use crate::error::Result;
use rusqlite::Connection;

/// Create the watch-list and log sheets if they are missing
pub fn run_migrations(conn: &Connection, stocks_sheet: &str, logs_sheet: &str) -> Result<()> {
    run_migration(conn, stocks_sheet, REQUIRED_COLUMNS)?;
    run_migration(conn, logs_sheet, LOG_COLUMNS)?;

    tracing::info!("Workbook sheets ready");
    Ok(())
}

fn run_migration(conn: &Connection, sheet: &str, columns: &[&str]) -> Result<()> {
    if tables::table_exists(conn, sheet)? {
        tracing::debug!("Sheet '{}' already exists", sheet);
        return Ok(());
    }

    tracing::info!("Creating sheet: {}", sheet);
    let headers: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    tables::create_sheet(conn, sheet, &headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, "Stocks", "Logs").unwrap();
        conn.execute("INSERT INTO \"Logs\" (\"Time\", \"Log\") VALUES ('t', 'kept')", [])
            .unwrap();

        run_migrations(&conn, "Stocks", "Logs").unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM \"Logs\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            tables::table_columns(&conn, "Stocks").unwrap(),
            REQUIRED_COLUMNS.to_vec()
        );
    }
}
