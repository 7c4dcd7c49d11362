//! Tabular store module
//!
//! The watch-list and the audit log live in a spreadsheet-like workbook:
//! named tables ("sheets") made of ordered rows with named columns. The
//! core logic only talks to the [`TabularStore`] trait; [`sqlite::SqliteWorkbook`]
//! is the production backend.
//!
//! Unknown columns are carried through every read-modify-write untouched.

pub mod logs;
pub mod models;
pub mod sqlite;

use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;

pub use sqlite::SqliteWorkbook;

/// One stored value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    /// Build a text cell
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// True for missing values and whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell; numeric text with grouping commas is accepted
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Real(f) if f.is_finite() => Some(*f),
            Cell::Text(s) => crate::quotes::parse_price(s),
            _ => None,
        }
    }

    /// Trimmed textual view of the cell, `None` when empty
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Blob(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Real(r) => write!(f, "{}", r),
            Cell::Text(s) => f.write_str(s),
            Cell::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// One row of a table, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: BTreeMap<String, Cell>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a column; absent columns read as [`Cell::Empty`]
    pub fn get(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Cell) {
        self.cells.insert(column.into(), value);
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn with(mut self, column: impl Into<String>, value: Cell) -> Self {
        self.set(column, value);
        self
    }

    /// Move a column's value to a new name
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.cells.remove(from) {
            self.cells.insert(to.to_string(), value);
        }
    }
}

/// An ordered set of rows sharing a header line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Stored header matching `name` when letter case is ignored
    pub fn find_column_ignore_case(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Make `name` available as a column. Returns `true` if it was missing.
    ///
    /// Column names are case-insensitive in the workbook, so a header that
    /// differs only in case (`notify` for `Notify`) is adopted under the
    /// requested spelling instead of being added a second time.
    pub fn ensure_column(&mut self, name: &str) -> bool {
        if self.has_column(name) {
            return false;
        }
        if let Some(existing) = self.find_column_ignore_case(name).map(str::to_string) {
            tracing::debug!("Using column '{}' as '{}'", existing, name);
            for header in self.headers.iter_mut().filter(|h| **h == existing) {
                *header = name.to_string();
            }
            for row in &mut self.rows {
                row.rename(&existing, name);
            }
            return false;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            if !row.contains(name) {
                row.set(name, Cell::Empty);
            }
        }
        true
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Workbook-like persistence used by the watch evaluator
pub trait TabularStore: Send + Sync {
    /// Fail with `StoreLocked` when another process holds the workbook
    fn ensure_unlocked(&self) -> Result<()>;

    /// Whether a sheet with this name exists
    fn has_table(&self, name: &str) -> Result<bool>;

    /// Read a whole sheet in stored order
    fn read_table(&self, name: &str) -> Result<Table>;

    /// Atomically replace the contents of a sheet, creating it or adding
    /// columns as needed. Existing columns are never dropped.
    fn replace_table(&self, name: &str, table: &Table) -> Result<()>;
}
