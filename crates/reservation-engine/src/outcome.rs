//! Results of engine operations.

use common::{ItemId, RecordId, ReservationToken, Version};
use domain::StockRecord;
use serde::Serialize;

/// Snapshot of a stock record after a supply was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplyReceipt {
    pub id: RecordId,
    pub item_id: ItemId,
    pub name: String,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub version: Version,
}

impl From<&StockRecord> for SupplyReceipt {
    fn from(stock: &StockRecord) -> Self {
        Self {
            id: stock.id(),
            item_id: stock.item_id(),
            name: stock.name().to_string(),
            total_quantity: stock.total_quantity(),
            available_quantity: stock.available_quantity(),
            version: stock.version(),
        }
    }
}

/// Result of a reservation attempt.
///
/// Running out of stock is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Units were claimed; `available` is what remains afterwards.
    Reserved {
        token: ReservationToken,
        available: u32,
    },

    /// Fewer units were available than requested.
    InsufficientStock { available: u32 },
}

impl ReserveOutcome {
    /// Returns the reservation token, if units were claimed.
    pub fn token(&self) -> Option<&ReservationToken> {
        match self {
            ReserveOutcome::Reserved { token, .. } => Some(token),
            ReserveOutcome::InsufficientStock { .. } => None,
        }
    }

    /// Returns the availability observed by the attempt.
    pub fn available(&self) -> u32 {
        match self {
            ReserveOutcome::Reserved { available, .. }
            | ReserveOutcome::InsufficientStock { available } => *available,
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved { .. })
    }
}

/// Result of a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The reservation was active and its units were released.
    Cancelled,

    /// The reservation had been cancelled before; nothing changed.
    AlreadyCancelled,
}

impl CancelOutcome {
    /// Returns the status message shown to callers.
    pub fn message(&self) -> &'static str {
        match self {
            CancelOutcome::Cancelled => "Reservation cancelled",
            CancelOutcome::AlreadyCancelled => "Reservation already cancelled",
        }
    }
}

impl std::fmt::Display for CancelOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
