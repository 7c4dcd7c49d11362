//! Watch-list and log models

use crate::db::{Cell, Record};
use std::fmt;

// ========== Column Names ==========

pub const TICKER: &str = "Ticker";
pub const LAST: &str = "Last";
pub const CROSS: &str = "Cross";
pub const GOAL: &str = "Goal";
pub const STATUS: &str = "Status";
pub const LAST_UPDATE: &str = "Last Update";
pub const NOTIFY: &str = "Notify";

/// Watch-list columns in canonical order
pub const REQUIRED_COLUMNS: &[&str] = &[TICKER, LAST, CROSS, GOAL, STATUS, LAST_UPDATE, NOTIFY];

pub const LOG_TIME: &str = "Time";
pub const LOG_MESSAGE: &str = "Log";

/// Log sheet columns
pub const LOG_COLUMNS: &[&str] = &[LOG_TIME, LOG_MESSAGE];

const SENT: &str = "Sent";

// ========== Enums ==========

/// Direction a price has to move through the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    Up,
    Down,
}

impl CrossDirection {
    /// Parse a direction, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

impl fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossDirection::Up => f.write_str("up"),
            CrossDirection::Down => f.write_str("down"),
        }
    }
}

/// Goal status as shown in the `Status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Unset,
    Ok,
    NotYet,
}

impl WatchStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "OK" => Self::Ok,
            "Not Yet" => Self::NotYet,
            _ => Self::Unset,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Unset => "",
            WatchStatus::Ok => "OK",
            WatchStatus::NotYet => "Not Yet",
        }
    }
}

/// Whether the crossing alert for a row has gone out
///
/// Any non-empty stored value counts as `Sent` so a manual note in the
/// column also suppresses alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyState {
    Unset,
    Sent,
}

// ========== Watch Row ==========

/// Why a row was left untouched
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// One or more of `Ticker`, `Cross`, `Goal` is empty
    MissingFields(Vec<&'static str>),
    /// `Cross` is neither `up` nor `down`
    InvalidCross(String),
    /// `Goal` is not a number
    InvalidGoal(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingFields(fields) => {
                let quoted: Vec<String> = fields.iter().map(|c| format!("'{}'", c)).collect();
                write!(f, "{} is empty", quoted.join(", "))
            }
            SkipReason::InvalidCross(raw) => {
                write!(f, "'{}' is '{}', expected 'up' or 'down'", CROSS, raw)
            }
            SkipReason::InvalidGoal(raw) => write!(f, "'{}' is '{}', not a number", GOAL, raw),
        }
    }
}

/// Typed view of one watch-list row
#[derive(Debug, Clone, PartialEq)]
pub struct WatchRow {
    pub ticker: String,
    pub last_price: Option<f64>,
    pub cross_direction: CrossDirection,
    pub goal_price: f64,
    pub status: WatchStatus,
    pub last_update: Option<String>,
    pub notify_state: NotifyState,
}

impl WatchRow {
    /// Validate and parse a stored record
    pub fn from_record(record: &Record) -> Result<Self, SkipReason> {
        let ticker = record.get(TICKER).as_text();
        let cross = record.get(CROSS).as_text();
        let goal = record.get(GOAL);

        let mut missing = Vec::new();
        if ticker.is_none() {
            missing.push(TICKER);
        }
        if cross.is_none() {
            missing.push(CROSS);
        }
        if goal.is_empty() {
            missing.push(GOAL);
        }

        let (Some(ticker), Some(cross)) = (ticker, cross) else {
            return Err(SkipReason::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(SkipReason::MissingFields(missing));
        }

        let cross_direction =
            CrossDirection::parse(&cross).ok_or_else(|| SkipReason::InvalidCross(cross.clone()))?;
        let goal_price = goal
            .as_number()
            .ok_or_else(|| SkipReason::InvalidGoal(goal.to_string()))?;

        let notify_state = if record.get(NOTIFY).is_empty() {
            NotifyState::Unset
        } else {
            NotifyState::Sent
        };

        Ok(Self {
            ticker,
            last_price: record.get(LAST).as_number(),
            cross_direction,
            goal_price,
            status: record
                .get(STATUS)
                .as_text()
                .map(|s| WatchStatus::parse(&s))
                .unwrap_or(WatchStatus::Unset),
            last_update: record.get(LAST_UPDATE).as_text(),
            notify_state,
        })
    }

    /// Write the evaluator-owned fields back into the stored record
    ///
    /// Only `Last`, `Status`, `Last Update` and `Notify` are touched; a
    /// non-empty `Notify` value is never overwritten.
    pub fn apply_to(&self, record: &mut Record) {
        if let Some(price) = self.last_price {
            if record.get(LAST).as_number() != Some(price) {
                record.set(LAST, Cell::Real(price));
            }
        }
        if self.status != WatchStatus::Unset {
            record.set(STATUS, Cell::text(self.status.as_str()));
        }
        if let Some(ref stamp) = self.last_update {
            record.set(LAST_UPDATE, Cell::text(stamp.clone()));
        }
        if self.notify_state == NotifyState::Sent && record.get(NOTIFY).is_empty() {
            record.set(NOTIFY, Cell::text(SENT));
        }
    }
}

// ========== Log ==========

/// One line of the audit log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(time: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticker: Cell, cross: Cell, goal: Cell) -> Record {
        Record::new()
            .with(TICKER, ticker)
            .with(CROSS, cross)
            .with(GOAL, goal)
    }

    #[test]
    fn test_cross_direction_parse() {
        assert_eq!(CrossDirection::parse("down"), Some(CrossDirection::Down));
        assert_eq!(CrossDirection::parse(" UP "), Some(CrossDirection::Up));
        assert_eq!(CrossDirection::parse("sideways"), None);
    }

    #[test]
    fn test_from_record_parses_all_fields() {
        let rec = record(Cell::text("AAPL"), Cell::text("Down"), Cell::Integer(150))
            .with(LAST, Cell::Real(160.0))
            .with(STATUS, Cell::text("Not Yet"))
            .with(LAST_UPDATE, Cell::text("2024-01-02 09:30:00"));

        let row = WatchRow::from_record(&rec).unwrap();
        assert_eq!(row.ticker, "AAPL");
        assert_eq!(row.cross_direction, CrossDirection::Down);
        assert_eq!(row.goal_price, 150.0);
        assert_eq!(row.last_price, Some(160.0));
        assert_eq!(row.status, WatchStatus::NotYet);
        assert_eq!(row.notify_state, NotifyState::Unset);
    }

    #[test]
    fn test_from_record_reports_missing_fields() {
        let rec = record(Cell::text("AAPL"), Cell::Empty, Cell::text(" "));
        assert_eq!(
            WatchRow::from_record(&rec),
            Err(SkipReason::MissingFields(vec![CROSS, GOAL]))
        );

        let rec = record(Cell::Empty, Cell::text("up"), Cell::Integer(1));
        assert_eq!(
            WatchRow::from_record(&rec),
            Err(SkipReason::MissingFields(vec![TICKER]))
        );
    }

    #[test]
    fn test_from_record_rejects_bad_values() {
        let rec = record(Cell::text("AAPL"), Cell::text("left"), Cell::Integer(1));
        assert_eq!(
            WatchRow::from_record(&rec),
            Err(SkipReason::InvalidCross("left".into()))
        );

        let rec = record(Cell::text("AAPL"), Cell::text("up"), Cell::text("soon"));
        assert_eq!(
            WatchRow::from_record(&rec),
            Err(SkipReason::InvalidGoal("soon".into()))
        );
    }

    #[test]
    fn test_any_notify_text_counts_as_sent() {
        let rec = record(Cell::text("AAPL"), Cell::text("up"), Cell::Integer(1))
            .with(NOTIFY, Cell::text("done manually"));
        let row = WatchRow::from_record(&rec).unwrap();
        assert_eq!(row.notify_state, NotifyState::Sent);
    }

    #[test]
    fn test_apply_to_keeps_foreign_columns_and_notify_text() {
        let mut rec = record(Cell::text("AAPL"), Cell::text("up"), Cell::Integer(1))
            .with("Sector", Cell::text("Tech"))
            .with(NOTIFY, Cell::text("manual"));
        let mut row = WatchRow::from_record(&rec).unwrap();
        row.last_price = Some(2.5);
        row.status = WatchStatus::Ok;
        row.last_update = Some("2024-01-02 09:30:00".into());

        row.apply_to(&mut rec);

        assert_eq!(rec.get(LAST), &Cell::Real(2.5));
        assert_eq!(rec.get(STATUS), &Cell::text("OK"));
        assert_eq!(rec.get(NOTIFY), &Cell::text("manual"));
        assert_eq!(rec.get("Sector"), &Cell::text("Tech"));
    }

    #[test]
    fn test_skip_reason_messages() {
        let reason = SkipReason::MissingFields(vec![TICKER, GOAL]);
        assert_eq!(reason.to_string(), "'Ticker', 'Goal' is empty");
    }
}
