//! Domain error types.

use common::ItemId;
use thiserror::Error;

/// Errors that can occur during pure record operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Adding supply would overflow the total quantity counter.
    #[error("Supply of {added} units would overflow total quantity {total} for item {item_id}")]
    QuantityOverflow {
        item_id: ItemId,
        total: u32,
        added: u32,
    },

    /// A stored reservation status could not be recognised.
    #[error("Unknown reservation status: {0}")]
    UnknownStatus(String),
}
