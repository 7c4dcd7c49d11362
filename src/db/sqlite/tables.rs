//! Low-level sheet helpers over a raw SQLite connection
//!
//! Sheets are plain SQLite tables without declared column types, so every
//! cell keeps whatever storage class it was written with.

use crate::db::{Cell, Record, Table};
use crate::error::{AppError, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

/// Quote a table or column name as an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check whether a sheet exists
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Column names of a sheet in declaration order
pub fn table_columns(conn: &Connection, name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
    let columns = stmt.query_map([], |row| row.get::<_, String>(1))?;
    Ok(columns.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Load every row of a sheet in insertion order
pub fn load_table(conn: &Connection, name: &str) -> Result<Table> {
    if !table_exists(conn, name)? {
        return Err(AppError::NotFound(format!("Sheet '{}' not found", name)));
    }

    let headers = table_columns(conn, name)?;
    let column_list = headers
        .iter()
        .map(|h| quote_ident(h))
        .collect::<Vec<_>>()
        .join(", ");

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY rowid",
        column_list,
        quote_ident(name)
    ))?;

    let rows = stmt.query_map([], |row| {
        let mut record = Record::new();
        for (idx, header) in headers.iter().enumerate() {
            record.set(header.clone(), cell_from_value(row.get_ref(idx)?));
        }
        Ok(record)
    })?;

    let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Table { headers, rows })
}

/// Replace all rows of a sheet inside the caller's transaction
pub fn store_table(conn: &Connection, name: &str, table: &Table) -> Result<()> {
    if table.headers.is_empty() {
        return Err(AppError::Validation(format!(
            "Sheet '{}' must have at least one column",
            name
        )));
    }

    let quoted_name = quote_ident(name);

    if table_exists(conn, name)? {
        let existing = table_columns(conn, name)?;
        // SQLite column names are case-insensitive
        let is_new = |header: &&String| !existing.iter().any(|e| e.eq_ignore_ascii_case(header));
        for header in table.headers.iter().filter(is_new) {
            tracing::info!("Adding column '{}' to sheet '{}'", header, name);
            conn.execute(
                &format!("ALTER TABLE {} ADD COLUMN {}", quoted_name, quote_ident(header)),
                [],
            )?;
        }
    } else {
        create_sheet(conn, name, &table.headers)?;
    }

    conn.execute(&format!("DELETE FROM {}", quoted_name), [])?;

    let column_list = table
        .headers
        .iter()
        .map(|h| quote_ident(h))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.headers.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted_name, column_list, placeholders
    ))?;

    for record in &table.rows {
        stmt.execute(params_from_iter(table.headers.iter().map(|h| record.get(h))))?;
    }

    Ok(())
}

/// Create an untyped sheet with the given headers
pub fn create_sheet(conn: &Connection, name: &str, headers: &[String]) -> Result<()> {
    let columns = headers
        .iter()
        .map(|h| quote_ident(h))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!("CREATE TABLE IF NOT EXISTS {} ({})", quote_ident(name), columns),
        [],
    )?;
    Ok(())
}

fn cell_from_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Empty,
        ValueRef::Integer(i) => Cell::Integer(i),
        ValueRef::Real(f) => Cell::Real(f),
        ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Empty => ToSqlOutput::Borrowed(ValueRef::Null),
            Cell::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Cell::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Cell::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Cell::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("Last Update"), "\"Last Update\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_store_and_load_preserves_types_and_order() {
        let conn = Connection::open_in_memory().unwrap();

        let mut table = Table::new(["Ticker", "Goal", "Memo"]);
        table.push(
            Record::new()
                .with("Ticker", Cell::text("MSFT"))
                .with("Goal", Cell::Integer(300))
                .with("Memo", Cell::Blob(vec![1, 2, 3])),
        );
        table.push(
            Record::new()
                .with("Ticker", Cell::text("AAPL"))
                .with("Goal", Cell::Real(150.5)),
        );

        store_table(&conn, "Stocks", &table).unwrap();
        let loaded = load_table(&conn, "Stocks").unwrap();

        assert_eq!(loaded.headers, vec!["Ticker", "Goal", "Memo"]);
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rows[0].get("Ticker"), &Cell::text("MSFT"));
        assert_eq!(loaded.rows[0].get("Goal"), &Cell::Integer(300));
        assert_eq!(loaded.rows[0].get("Memo"), &Cell::Blob(vec![1, 2, 3]));
        assert_eq!(loaded.rows[1].get("Goal"), &Cell::Real(150.5));
        assert_eq!(loaded.rows[1].get("Memo"), &Cell::Empty);
    }

    #[test]
    fn test_store_adds_new_columns_without_dropping() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE \"Stocks\" (\"Ticker\", \"Sector\");")
            .unwrap();

        let mut table = Table::new(["Ticker", "Notify"]);
        table.push(
            Record::new()
                .with("Ticker", Cell::text("AAPL"))
                .with("Notify", Cell::text("Sent")),
        );
        store_table(&conn, "Stocks", &table).unwrap();

        let columns = table_columns(&conn, "Stocks").unwrap();
        assert_eq!(columns, vec!["Ticker", "Sector", "Notify"]);
    }

    #[test]
    fn test_store_matches_existing_columns_ignoring_case() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE \"Stocks\" (\"Ticker\", \"notify\");
             INSERT INTO \"Stocks\" VALUES ('AAPL', NULL);",
        )
        .unwrap();

        let mut table = Table::new(["Ticker", "Notify"]);
        table.push(
            Record::new()
                .with("Ticker", Cell::text("AAPL"))
                .with("Notify", Cell::text("Sent")),
        );
        store_table(&conn, "Stocks", &table).unwrap();

        assert_eq!(table_columns(&conn, "Stocks").unwrap(), vec!["Ticker", "notify"]);
        let loaded = load_table(&conn, "Stocks").unwrap();
        assert_eq!(loaded.rows[0].get("notify"), &Cell::text("Sent"));
    }

    #[test]
    fn test_load_missing_sheet() {
        let conn = Connection::open_in_memory().unwrap();
        let result = load_table(&conn, "Stocks");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_store_rejects_headerless_table() {
        let conn = Connection::open_in_memory().unwrap();
        let result = store_table(&conn, "Stocks", &Table::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
