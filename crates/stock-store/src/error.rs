use thiserror::Error;

use crate::{ItemId, Version};

/// Errors that can occur when interacting with the lookup store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write was rejected because the stored version
    /// no longer matches the version the writer read.
    #[error("Version conflict for item {item_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        item_id: ItemId,
        expected: Version,
        actual: Version,
    },

    /// The write was malformed and never reached storage.
    #[error("Invalid write: {0}")]
    InvalidWrite(String),

    /// A stored row could not be turned back into a record.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// The store cannot serve requests right now.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value violated a domain rule.
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),
}

impl StoreError {
    /// Returns true if this error signals a lost optimistic-concurrency race.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
