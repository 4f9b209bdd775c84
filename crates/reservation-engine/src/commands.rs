//! Engine commands.

use common::{ItemId, ReservationToken, Version};

/// Command to register newly arrived units of an item.
#[derive(Debug, Clone)]
pub struct ApplySupply {
    /// The item receiving stock.
    pub item_id: ItemId,

    /// Display label, used only when the item is created.
    pub name: String,

    /// Units to add.
    pub quantity: u32,

    /// Version the caller last saw. When set and the item exists, the
    /// supply is rejected unless the stored version still matches.
    pub expected_version: Option<Version>,
}

impl ApplySupply {
    /// Creates a new ApplySupply command without a version check.
    pub fn new(item_id: ItemId, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id,
            name: name.into(),
            quantity,
            expected_version: None,
        }
    }

    /// Requires the stored record to be at `version`.
    pub fn expecting(mut self, version: Version) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Command to claim units of an item.
#[derive(Debug, Clone)]
pub struct ReserveItem {
    /// The item to reserve.
    pub item_id: ItemId,

    /// Units to claim; must be positive.
    pub quantity: u32,

    /// Caller identity, recorded for audit.
    pub reserved_by: String,
}

impl ReserveItem {
    /// Creates a new ReserveItem command.
    pub fn new(item_id: ItemId, quantity: u32, reserved_by: impl Into<String>) -> Self {
        Self {
            item_id,
            quantity,
            reserved_by: reserved_by.into(),
        }
    }
}

/// Command to release a reservation.
#[derive(Debug, Clone)]
pub struct CancelReservation {
    /// Token returned by a successful reservation.
    pub token: ReservationToken,
}

impl CancelReservation {
    /// Creates a new CancelReservation command.
    pub fn new(token: impl Into<ReservationToken>) -> Self {
        Self {
            token: token.into(),
        }
    }
}
