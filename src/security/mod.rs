//! Credential storage
//!
//! The bot token can live in the OS keychain so it does not have to sit in
//! the environment or a `.env` file next to the workbook.

mod keychain;

pub use keychain::{KeychainManager, TELEGRAM_TOKEN_ENTRY};
