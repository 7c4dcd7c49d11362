//! OS Keychain integration using the keyring crate

use crate::error::{AppError, Result};
use keyring::Entry;

const SERVICE: &str = "stock-chaser";

/// Keychain entry name for the bot token
pub const TELEGRAM_TOKEN_ENTRY: &str = "telegram-token";

/// Keychain manager for secure credential storage
pub struct KeychainManager {
    service: String,
}

impl KeychainManager {
    pub fn new() -> Self {
        Self {
            service: SERVICE.to_string(),
        }
    }

    /// Get a secret from the keychain
    pub fn get_secret(&self, name: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, name).map_err(AppError::Keychain)?;

        match entry.get_password() {
            Ok(secret) if secret.trim().is_empty() => Ok(None),
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Keychain(e)),
        }
    }

    /// Store a secret in the keychain
    pub fn store_secret(&self, name: &str, value: &str) -> Result<()> {
        let entry = Entry::new(&self.service, name).map_err(AppError::Keychain)?;

        entry.set_password(value).map_err(AppError::Keychain)?;

        tracing::info!("Stored '{}' in the {} keychain", name, self.service);
        Ok(())
    }
}

impl Default for KeychainManager {
    fn default() -> Self {
        Self::new()
    }
}
