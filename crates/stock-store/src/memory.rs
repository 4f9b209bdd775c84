use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use domain::{ReservationRecord, StockRecord};
use tokio::sync::RwLock;

use crate::{
    ItemId, ReservationToken, Result, StoreError, Version,
    store::{LookupStore, StockWrite, WriteOptions, validate_write},
};

#[derive(Debug, Default)]
struct MemoryState {
    stock: HashMap<ItemId, StockRecord>,
    reservations: HashMap<ReservationToken, ReservationRecord>,
    /// Number of upcoming commits that lose a race against a simulated writer.
    concurrent_writes: usize,
    unavailable: bool,
}

/// In-memory lookup store implementation for testing.
///
/// This implementation keeps all records in memory and provides the same
/// conditional-write semantics as the PostgreSQL implementation: a commit
/// holds the write lock for the version check, the stock update and the
/// reservation update, so the unit is never observed half-applied.
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    state: Arc<RwLock<MemoryState>>,
    stock_reads: Arc<AtomicUsize>,
}

impl InMemoryStockStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stock records stored.
    pub async fn stock_count(&self) -> usize {
        self.state.read().await.stock.len()
    }

    /// Returns the number of reservation records stored.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    /// Returns how many times `get_stock` has been called.
    pub fn stock_reads(&self) -> usize {
        self.stock_reads.load(Ordering::SeqCst)
    }

    /// Makes the next `count` commits against existing items race a
    /// simulated concurrent writer that bumps the stored version first.
    pub async fn inject_concurrent_writes(&self, count: usize) {
        self.state.write().await.concurrent_writes = count;
    }

    /// Makes every call fail with `Unavailable` until switched back.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Deletes a stock record behind the engine's back, leaving its
    /// reservations dangling.
    pub async fn remove_stock(&self, item_id: ItemId) {
        self.state.write().await.stock.remove(&item_id);
    }

    /// Clears all records and injected faults.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
    }
}

fn check_available(state: &MemoryState) -> Result<()> {
    if state.unavailable {
        return Err(StoreError::Unavailable(
            "in-memory store switched off".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl LookupStore for InMemoryStockStore {
    async fn get_stock(&self, item_id: ItemId) -> Result<Option<StockRecord>> {
        self.stock_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        check_available(&state)?;
        Ok(state.stock.get(&item_id).cloned())
    }

    async fn get_reservation(&self, token: &ReservationToken) -> Result<Option<ReservationRecord>> {
        let state = self.state.read().await;
        check_available(&state)?;
        Ok(state.reservations.get(token).cloned())
    }

    async fn commit(&self, write: StockWrite, options: WriteOptions) -> Result<StockRecord> {
        validate_write(&write)?;

        let item_id = write.item_id();
        let mut state = self.state.write().await;
        check_available(&state)?;

        if state.concurrent_writes > 0 {
            state.concurrent_writes -= 1;
            if let Some(existing) = state.stock.get_mut(&item_id) {
                let bumped = existing.version().next();
                existing.set_version(bumped);
            }
        }

        let existing = state.stock.get(&item_id);
        let current_version = existing.map_or(Version::initial(), StockRecord::version);

        // Check expected version if specified
        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            metrics::counter!("inventory_store_conflicts_total").increment(1);
            return Err(StoreError::VersionConflict {
                item_id,
                expected,
                actual: current_version,
            });
        }

        if let Some(existing) = existing
            && existing.id() != write.stock.id()
        {
            return Err(StoreError::InvalidWrite(format!(
                "Item {item_id} is stored as record {}, not {}",
                existing.id(),
                write.stock.id()
            )));
        }

        let mut stock = write.stock;
        stock.set_version(current_version.next());
        state.stock.insert(item_id, stock.clone());

        if let Some(reservation) = write.reservation {
            state
                .reservations
                .insert(reservation.token().clone(), reservation);
        }

        Ok(stock)
    }

    async fn reservations_for_item(&self, item_id: ItemId) -> Result<Vec<ReservationRecord>> {
        let state = self.state.read().await;
        check_available(&state)?;
        let mut reservations: Vec<_> = state
            .reservations
            .values()
            .filter(|r| r.item_id() == item_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.created_at());
        Ok(reservations)
    }
}
