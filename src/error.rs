//! Application error types

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("Workbook is locked: {0}")]
    StoreLocked(String),

    #[error("Workbook access error: {0}")]
    StoreAccess(String),

    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable code used in log lines
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Keychain(_) => "KEYCHAIN_ERROR",
            AppError::StoreLocked(_) => "STORE_LOCKED",
            AppError::StoreAccess(_) => "STORE_ACCESS_ERROR",
            AppError::PriceUnavailable(_) => "PRICE_UNAVAILABLE",
            AppError::Notify(_) => "NOTIFY_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Usage(_) => "USAGE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for an error that ends the run
    ///
    /// Configuration and usage problems exit with 2, everything else that
    /// aborts a run (locked or unreadable workbook, session failures) with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Usage(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
