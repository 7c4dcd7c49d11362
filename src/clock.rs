//! Wall-clock timestamps for the workbook
//!
//! All stamps written to the `Last Update` and `Time` columns share the
//! `%Y-%m-%d %H:%M:%S` format, in the configured zone or local time.

use chrono::{Local, Utc};
use chrono_tz::Tz;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp source, optionally pinned to an IANA zone
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    tz: Option<Tz>,
}

impl Clock {
    pub fn new(tz: Option<Tz>) -> Self {
        Self { tz }
    }

    /// Current time formatted for the workbook
    pub fn now_stamp(&self) -> String {
        match self.tz {
            Some(tz) => Utc::now().with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
            None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}
