//! SQLite workbook backend

mod migrations;
pub mod tables;

use crate::db::{Table, TabularStore};
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long regular statements wait on a busy workbook
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Workbook stored as a single SQLite file, one table per sheet
pub struct SqliteWorkbook {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteWorkbook {
    /// Open an existing workbook for reading and writing
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::StoreAccess(format!(
                "Workbook not found: {}",
                path.display()
            )));
        }

        let conn = open_read_write(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        tracing::debug!("Opened workbook {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Create (or complete) a workbook with empty watch-list and log sheets
    pub fn create(path: &Path, stocks_sheet: &str, logs_sheet: &str) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run_migrations(&conn, stocks_sheet, logs_sheet)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TabularStore for SqliteWorkbook {
    fn ensure_unlocked(&self) -> Result<()> {
        // Another program holding the file open exclusively shows up as a
        // permission error on platforms with mandatory locking.
        if let Err(e) = OpenOptions::new().read(true).write(true).open(&self.path) {
            return Err(match e.kind() {
                ErrorKind::PermissionDenied => AppError::StoreLocked(format!(
                    "{} is held by another process",
                    self.path.display()
                )),
                _ => AppError::StoreAccess(format!("{}: {}", self.path.display(), e)),
            });
        }

        let probe = open_read_write(&self.path)?;
        probe.busy_timeout(Duration::ZERO)?;

        match probe.execute_batch("BEGIN IMMEDIATE; ROLLBACK;") {
            Ok(()) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                Err(AppError::StoreLocked(format!(
                    "{} has a pending write from another process",
                    self.path.display()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        tables::table_exists(&conn, name)
    }

    fn read_table(&self, name: &str) -> Result<Table> {
        let conn = self.conn.lock();
        tables::load_table(&conn, name)
    }

    fn replace_table(&self, name: &str, table: &Table) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tables::store_table(&tx, name, table)?;
        tx.commit()?;

        tracing::debug!("Wrote {} rows to sheet '{}'", table.len(), name);
        Ok(())
    }
}

fn open_read_write(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| AppError::StoreAccess(format!("Failed to open {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Cell, Record};
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_workbook() {
        let dir = tempdir().unwrap();
        let result = SqliteWorkbook::open(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(AppError::StoreAccess(_))));
    }

    #[test]
    fn test_create_then_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("watch.db");

        SqliteWorkbook::create(&path, "Stocks", "Logs").unwrap();
        let workbook = SqliteWorkbook::open(&path).unwrap();

        assert!(workbook.has_table("Stocks").unwrap());
        assert!(workbook.has_table("Logs").unwrap());
        assert!(workbook.read_table("Stocks").unwrap().is_empty());
    }

    #[test]
    fn test_replace_table_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watch.db");
        let workbook = SqliteWorkbook::create(&path, "Stocks", "Logs").unwrap();

        let mut table = workbook.read_table("Stocks").unwrap();
        table.push(
            Record::new()
                .with("Ticker", Cell::text("AAPL"))
                .with("Goal", Cell::Real(150.0)),
        );
        workbook.replace_table("Stocks", &table).unwrap();

        let reopened = SqliteWorkbook::open(&path).unwrap();
        let loaded = reopened.read_table("Stocks").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.rows[0].get("Ticker"), &Cell::text("AAPL"));
        assert_eq!(loaded.rows[0].get("Goal"), &Cell::Real(150.0));
    }

    #[test]
    fn test_unlocked_workbook_passes_preflight() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watch.db");
        let workbook = SqliteWorkbook::create(&path, "Stocks", "Logs").unwrap();

        assert!(workbook.ensure_unlocked().is_ok());
    }

    #[test]
    fn test_pending_write_is_detected_as_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watch.db");
        let workbook = SqliteWorkbook::create(&path, "Stocks", "Logs").unwrap();

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN IMMEDIATE;").unwrap();

        let result = workbook.ensure_unlocked();
        assert!(matches!(result, Err(AppError::StoreLocked(_))));

        other.execute_batch("ROLLBACK;").unwrap();
        assert!(workbook.ensure_unlocked().is_ok());
    }
}
