//! CLI commands
//!
//! One module per verb accepted by the `stock-chaser` binary.

pub mod watch;
pub mod workbook;

pub use watch::run_watch;
pub use workbook::init_workbook;
