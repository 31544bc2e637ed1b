//! Journal error types

use crate::models::TradeId;
use thiserror::Error;

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// Failures of the backing record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not replace the data file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Schema migration error: {0}")]
    Migration(#[from] migration::MigrationError),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid value {value:?} in column {column} at row {row}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Duplicate trade identifier: {0}")]
    DuplicateId(String),

    #[error("Invalid schema header: {0}")]
    InvalidSchemaHeader(String),
}

/// Errors surfaced by the trade repository
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Trade not found: {0}")]
    NotFound(TradeId),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl JournalError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JournalError::NotFound(_))
    }
}

/// Rejected user input, checked by the presentation layer before create/update
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("请输入股票代码")]
    EmptyCode,

    #[error("Buy quantity must be positive")]
    ZeroBuyQuantity,

    #[error("{0} must not be negative")]
    NegativePrice(&'static str),
}
