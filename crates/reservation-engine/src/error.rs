//! Engine error types.

use common::{ItemId, Version};
use domain::DomainError;
use stock_store::StoreError;
use thiserror::Error;

/// Category of an engine failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The item has never been stocked.
    NotFound,
    /// A concurrent writer won, or contention exhausted the retry budget.
    Conflict,
    /// No reservation carries the given token.
    InvalidToken,
    /// Stored records contradict each other or could not be read back.
    Integrity,
    /// The request arguments were rejected.
    InvalidInput,
    /// The store failed for a reason other than a version conflict.
    Unavailable,
}

/// Errors returned by the reservation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The item has no stock record.
    #[error("Inventory item is not found with id {item_id}")]
    NotFound { item_id: ItemId },

    /// The caller's (or the reader's) version no longer matches the store.
    #[error("Version mismatch for item {item_id}: expected {expected}, actual {actual}")]
    VersionMismatch {
        item_id: ItemId,
        expected: Version,
        actual: Version,
    },

    /// Every reservation attempt lost a race against another writer.
    #[error("Contention on item {item_id} exceeded the retry budget of {attempts} attempts")]
    ContentionExhausted { item_id: ItemId, attempts: u32 },

    /// No reservation carries the given token.
    #[error("Invalid reservation token: {0}")]
    InvalidToken(String),

    /// A reservation references a stock record that does not exist.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The request arguments were rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stock operation was rejected.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl EngineError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::VersionMismatch { .. } | EngineError::ContentionExhausted { .. } => {
                ErrorKind::Conflict
            }
            EngineError::InvalidToken(_) => ErrorKind::InvalidToken,
            EngineError::Integrity(_) => ErrorKind::Integrity,
            EngineError::InvalidInput(_) | EngineError::Domain(_) => ErrorKind::InvalidInput,
            EngineError::Storage(
                StoreError::InvalidWrite(_) | StoreError::InvalidRow(_) | StoreError::Domain(_),
            ) => ErrorKind::Integrity,
            EngineError::Storage(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict {
                item_id,
                expected,
                actual,
            } => EngineError::VersionMismatch {
                item_id,
                expected,
                actual,
            },
            other => EngineError::Storage(other),
        }
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_becomes_version_mismatch() {
        let err: EngineError = StoreError::VersionConflict {
            item_id: ItemId::new(1),
            expected: Version::new(1),
            actual: Version::new(2),
        }
        .into();

        assert!(matches!(err, EngineError::VersionMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn other_store_failures_are_unavailable() {
        let err: EngineError = StoreError::Unavailable("down".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn malformed_store_data_is_an_integrity_failure() {
        let faults = [
            StoreError::InvalidWrite("reservation for another item".to_string()),
            StoreError::InvalidRow("unknown status".to_string()),
            StoreError::Domain(DomainError::UnknownStatus("HELD".to_string())),
        ];

        for fault in faults {
            let err: EngineError = fault.into();
            assert!(matches!(err, EngineError::Storage(_)));
            assert_eq!(err.kind(), ErrorKind::Integrity);
        }
    }

    #[test]
    fn not_found_message_names_the_item() {
        let err = EngineError::NotFound {
            item_id: ItemId::new(1),
        };
        assert_eq!(err.to_string(), "Inventory item is not found with id 1");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn exhausted_contention_is_a_conflict() {
        let err = EngineError::ContentionExhausted {
            item_id: ItemId::new(1),
            attempts: 3,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn overflow_is_invalid_input() {
        let err: EngineError = DomainError::QuantityOverflow {
            item_id: ItemId::new(1),
            total: u32::MAX,
            added: 1,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
