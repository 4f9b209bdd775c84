use async_trait::async_trait;
use domain::{ReservationRecord, StockRecord};

use crate::{ItemId, ReservationToken, Result, StoreError, Version};

/// Options for committing a write to the store.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Version the writer read before mutating the record.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl WriteOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored record to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the item to not be stored yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A unit of work for the store: the updated stock record, plus the
/// reservation whose creation or status change accompanies it.
///
/// Both parts are persisted together or not at all.
#[derive(Debug, Clone)]
pub struct StockWrite {
    pub stock: StockRecord,
    pub reservation: Option<ReservationRecord>,
}

impl StockWrite {
    /// Creates a write touching only the stock record.
    pub fn stock(stock: StockRecord) -> Self {
        Self {
            stock,
            reservation: None,
        }
    }

    /// Adds a reservation record to the unit.
    pub fn with_reservation(mut self, reservation: ReservationRecord) -> Self {
        self.reservation = Some(reservation);
        self
    }

    /// Returns the item this write targets.
    pub fn item_id(&self) -> ItemId {
        self.stock.item_id()
    }
}

/// Durable keyed storage for stock and reservation records.
///
/// Every call is atomic and linearizable per item. All implementations must
/// be thread-safe (Send + Sync).
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Retrieves the stock record of an item.
    ///
    /// Returns None if the item was never stocked.
    async fn get_stock(&self, item_id: ItemId) -> Result<Option<StockRecord>>;

    /// Retrieves a reservation by token.
    ///
    /// Returns None if no reservation carries this token.
    async fn get_reservation(&self, token: &ReservationToken) -> Result<Option<ReservationRecord>>;

    /// Persists a write atomically.
    ///
    /// If `options.expected_version` is set, the write fails with
    /// `VersionConflict` unless the stored version still equals it. On
    /// success the store bumps the version and returns the stored record.
    async fn commit(&self, write: StockWrite, options: WriteOptions) -> Result<StockRecord>;

    /// Retrieves every reservation ever made against an item, oldest first.
    async fn reservations_for_item(&self, item_id: ItemId) -> Result<Vec<ReservationRecord>>;
}

/// Extension trait providing convenience methods for lookup stores.
#[async_trait]
pub trait LookupStoreExt: LookupStore {
    /// Checks if an item has a stock record.
    async fn stock_exists(&self, item_id: ItemId) -> Result<bool> {
        Ok(self.get_stock(item_id).await?.is_some())
    }

    /// Gets the current version of an item's stock record.
    ///
    /// Returns None if the item doesn't exist.
    async fn stock_version(&self, item_id: ItemId) -> Result<Option<Version>> {
        Ok(self.get_stock(item_id).await?.map(|stock| stock.version()))
    }

    /// Sums the quantities of all active reservations against an item.
    async fn outstanding_quantity(&self, item_id: ItemId) -> Result<u64> {
        let reservations = self.reservations_for_item(item_id).await?;
        Ok(reservations
            .iter()
            .filter(|r| r.is_active())
            .map(|r| u64::from(r.quantity()))
            .sum())
    }
}

// Blanket implementation for all LookupStore implementations
impl<T: LookupStore + ?Sized> LookupStoreExt for T {}

/// Validates a write before it is committed.
pub fn validate_write(write: &StockWrite) -> Result<()> {
    let Some(reservation) = &write.reservation else {
        return Ok(());
    };

    if reservation.item_id() != write.stock.item_id() {
        return Err(StoreError::InvalidWrite(format!(
            "Reservation {} targets item {}, but the stock record is for item {}",
            reservation.token(),
            reservation.item_id(),
            write.stock.item_id()
        )));
    }
    if reservation.quantity() == 0 {
        return Err(StoreError::InvalidWrite(format!(
            "Reservation {} has zero quantity",
            reservation.token()
        )));
    }
    if reservation.token().is_blank() {
        return Err(StoreError::InvalidWrite(
            "Reservation token must not be blank".to_string(),
        ));
    }

    Ok(())
}
