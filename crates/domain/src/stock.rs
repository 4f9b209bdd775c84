//! Stock record and its quantity operations.

use common::{ItemId, RecordId, Version};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Authoritative quantity state of one catalog item.
///
/// The record is a plain value: operations mutate it in memory and the
/// engine decides whether the result gets persisted. `reserved_quantity`
/// may exceed `total_quantity` after an external correction, which is why
/// availability is always computed with a floor at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Internal storage key.
    id: RecordId,

    /// Catalog identity of the item.
    item_id: ItemId,

    /// Display label, set on creation.
    name: String,

    /// Units physically in stock.
    total_quantity: u32,

    /// Units currently claimed by active reservations.
    reserved_quantity: u32,

    /// Version stamp for optimistic concurrency, owned by the store.
    version: Version,
}

impl StockRecord {
    /// Creates a record for an item that has never been stocked.
    pub fn new(item_id: ItemId, name: impl Into<String>, total_quantity: u32) -> Self {
        Self {
            id: RecordId::new(),
            item_id,
            name: name.into(),
            total_quantity,
            reserved_quantity: 0,
            version: Version::initial(),
        }
    }

    /// Rebuilds a record from stored fields.
    pub fn restore(
        id: RecordId,
        item_id: ItemId,
        name: impl Into<String>,
        total_quantity: u32,
        reserved_quantity: u32,
        version: Version,
    ) -> Self {
        Self {
            id,
            item_id,
            name: name.into(),
            total_quantity,
            reserved_quantity,
            version,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    pub fn reserved_quantity(&self) -> u32 {
        self.reserved_quantity
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version stamp.
    ///
    /// Only stores call this, after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Units that can still be reserved, floored at zero.
    pub fn available_quantity(&self) -> u32 {
        self.total_quantity.saturating_sub(self.reserved_quantity)
    }

    /// Adds newly arrived units to the total.
    ///
    /// A zero quantity is accepted and leaves the totals unchanged. On
    /// overflow the record is left untouched.
    pub fn add_supply(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.total_quantity = self.total_quantity.checked_add(quantity).ok_or(
            DomainError::QuantityOverflow {
                item_id: self.item_id,
                total: self.total_quantity,
                added: quantity,
            },
        )?;
        Ok(())
    }

    /// Claims `quantity` units if that many are available.
    ///
    /// Returns false and leaves the record unchanged when the quantity is
    /// zero or exceeds availability.
    pub fn reserve(&mut self, quantity: u32) -> bool {
        if quantity == 0 || self.available_quantity() < quantity {
            return false;
        }
        self.reserved_quantity += quantity;
        true
    }

    /// Releases `quantity` previously reserved units.
    ///
    /// Releasing more than is reserved means a reservation was processed
    /// twice somewhere; the counter is clamped at zero and the event is
    /// logged. Returns the number of units actually released.
    pub fn cancel_reservation(&mut self, quantity: u32) -> u32 {
        if quantity > self.reserved_quantity {
            tracing::error!(
                item_id = %self.item_id,
                reserved = self.reserved_quantity,
                requested = quantity,
                "reserved quantity underflow on cancellation, clamping to zero"
            );
            metrics::counter!("inventory_reserved_underflow_total").increment(1);
            let released = self.reserved_quantity;
            self.reserved_quantity = 0;
            return released;
        }
        self.reserved_quantity -= quantity;
        quantity
    }
}
