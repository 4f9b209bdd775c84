//! Reservation engine: supply, reserve, cancel and availability lookups.

use common::{ItemId, ReservationToken};
use domain::{ReservationRecord, StockRecord};
use stock_store::{LookupStore, StockWrite, WriteOptions};

use crate::cache::AvailabilityCache;
use crate::commands::{ApplySupply, CancelReservation, ReserveItem};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::outcome::{CancelOutcome, ReserveOutcome, SupplyReceipt};

/// Coordinates the lookup store and the availability cache.
///
/// The store is the sole authority. Every mutation is a conditional write
/// on the version that was read, and the cache is refreshed only after the
/// write is durable. A cache failure never fails an operation.
pub struct ReservationEngine<S, C>
where
    S: LookupStore,
    C: AvailabilityCache,
{
    store: S,
    cache: C,
    config: EngineConfig,
}

impl<S, C> ReservationEngine<S, C>
where
    S: LookupStore,
    C: AvailabilityCache,
{
    /// Creates a new engine over the given store and cache.
    pub fn new(store: S, cache: C, config: EngineConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the cache key holding the availability of `item_id`.
    pub fn cache_key(&self, item_id: ItemId) -> String {
        format!("{}{}", self.config.cache_key_prefix, item_id)
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Registers arriving units, creating the stock record on first supply.
    ///
    /// A storage-level version conflict is reported to the caller as
    /// `VersionMismatch`; supplies are not retried.
    #[tracing::instrument(skip(self, cmd), fields(item_id = %cmd.item_id, quantity = cmd.quantity))]
    pub async fn apply_supply(&self, cmd: ApplySupply) -> Result<SupplyReceipt> {
        let (stock, options) = match self.store.get_stock(cmd.item_id).await? {
            None => (
                StockRecord::new(cmd.item_id, cmd.name, cmd.quantity),
                WriteOptions::expect_new(),
            ),
            Some(mut stock) => {
                let read_version = stock.version();
                if let Some(expected) = cmd.expected_version
                    && expected != read_version
                {
                    return Err(EngineError::VersionMismatch {
                        item_id: cmd.item_id,
                        expected,
                        actual: read_version,
                    });
                }
                stock.add_supply(cmd.quantity)?;
                (stock, WriteOptions::expect_version(read_version))
            }
        };

        let stored = self.store.commit(StockWrite::stock(stock), options).await?;
        self.refresh_cache(&stored).await;

        metrics::counter!("inventory_supply_applied_total").increment(1);
        tracing::info!(
            version = %stored.version(),
            total = stored.total_quantity(),
            available = stored.available_quantity(),
            "supply applied"
        );

        Ok(SupplyReceipt::from(&stored))
    }

    /// Claims units of an item.
    ///
    /// Lost races against concurrent writers are retried up to
    /// `max_attempts` times. Insufficient stock returns immediately and is
    /// never retried.
    #[tracing::instrument(skip(self, cmd), fields(item_id = %cmd.item_id, quantity = cmd.quantity))]
    pub async fn reserve(&self, cmd: ReserveItem) -> Result<ReserveOutcome> {
        if cmd.quantity == 0 {
            return Err(EngineError::InvalidInput(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        if cmd.reserved_by.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "reserved_by must not be empty".to_string(),
            ));
        }

        let item_id = cmd.item_id;
        let max_attempts = self.max_attempts();

        for attempt in 1..=max_attempts {
            let mut stock = self
                .store
                .get_stock(item_id)
                .await?
                .ok_or(EngineError::NotFound { item_id })?;
            let read_version = stock.version();

            if !stock.reserve(cmd.quantity) {
                let available = stock.available_quantity();
                metrics::counter!("inventory_reservations_total", "outcome" => "insufficient")
                    .increment(1);
                metrics::histogram!("inventory_reserve_attempts").record(f64::from(attempt));
                tracing::info!(available, "insufficient stock");
                return Ok(ReserveOutcome::InsufficientStock { available });
            }

            let reservation = ReservationRecord::new(item_id, cmd.quantity, cmd.reserved_by.clone());
            let token = reservation.token().clone();
            let write = StockWrite::stock(stock).with_reservation(reservation);

            match self
                .store
                .commit(write, WriteOptions::expect_version(read_version))
                .await
            {
                Ok(stored) => {
                    self.refresh_cache(&stored).await;
                    let available = stored.available_quantity();
                    metrics::counter!("inventory_reservations_total", "outcome" => "reserved")
                        .increment(1);
                    metrics::histogram!("inventory_reserve_attempts").record(f64::from(attempt));
                    tracing::info!(%token, available, attempt, "reservation created");
                    return Ok(ReserveOutcome::Reserved { token, available });
                }
                Err(e) if e.is_version_conflict() => {
                    metrics::counter!("inventory_reserve_conflicts_total").increment(1);
                    tracing::debug!(attempt, max_attempts, "version conflict, retrying reservation");
                }
                Err(e) => return Err(e.into()),
            }
        }

        metrics::counter!("inventory_reservations_total", "outcome" => "contention").increment(1);
        metrics::histogram!("inventory_reserve_attempts").record(f64::from(max_attempts));
        tracing::warn!(max_attempts, "reservation gave up after repeated version conflicts");
        Err(EngineError::ContentionExhausted {
            item_id,
            attempts: max_attempts,
        })
    }

    /// Releases a reservation's units back to its stock record.
    ///
    /// Cancelling twice is harmless: the second call reports
    /// `AlreadyCancelled` and changes nothing. Version conflicts re-read
    /// the reservation, so racing cancels of one token release it once.
    #[tracing::instrument(skip(self, cmd), fields(token = %cmd.token))]
    pub async fn cancel(&self, cmd: CancelReservation) -> Result<CancelOutcome> {
        let token = cmd.token;
        let max_attempts = self.max_attempts();

        let item_id = self.load_reservation(&token).await?.item_id();

        for attempt in 1..=max_attempts {
            // Stock before reservation: an active reservation must pair with
            // a version read before any commit that cancelled it.
            let stock = self.store.get_stock(item_id).await?;
            let mut reservation = self.load_reservation(&token).await?;

            if !reservation.is_active() {
                tracing::info!("reservation already cancelled");
                return Ok(CancelOutcome::AlreadyCancelled);
            }

            let Some(mut stock) = stock else {
                tracing::error!(%item_id, "reservation references a missing stock record");
                return Err(EngineError::Integrity(format!(
                    "Reservation {token} references item {item_id}, which has no stock record"
                )));
            };
            let read_version = stock.version();

            stock.cancel_reservation(reservation.quantity());
            reservation.cancel();
            let write = StockWrite::stock(stock).with_reservation(reservation.clone());

            match self
                .store
                .commit(write, WriteOptions::expect_version(read_version))
                .await
            {
                Ok(stored) => {
                    self.refresh_cache(&stored).await;
                    metrics::counter!("inventory_cancellations_total").increment(1);
                    tracing::info!(%item_id, available = stored.available_quantity(), "reservation cancelled");
                    return Ok(CancelOutcome::Cancelled);
                }
                Err(e) if e.is_version_conflict() => {
                    tracing::debug!(attempt, max_attempts, "version conflict, retrying cancellation");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(max_attempts, "cancellation gave up after repeated version conflicts");
        Err(EngineError::ContentionExhausted {
            item_id,
            attempts: max_attempts,
        })
    }

    /// Returns the available quantity of an item, preferring the cache.
    #[tracing::instrument(skip(self))]
    pub async fn get_availability(&self, item_id: ItemId) -> Result<u32> {
        let key = self.cache_key(item_id);

        match self.cache.get(&key).await {
            Ok(Some(available)) => {
                metrics::counter!("inventory_cache_hits_total").increment(1);
                return Ok(available);
            }
            Ok(None) => {
                metrics::counter!("inventory_cache_misses_total").increment(1);
            }
            Err(e) => {
                metrics::counter!("inventory_cache_errors_total").increment(1);
                tracing::warn!(error = %e, "cache read failed, falling back to store");
            }
        }

        let stock = self.get_stock(item_id).await?;
        let available = stock.available_quantity();
        self.write_cache(&key, available).await;
        Ok(available)
    }

    /// Returns the full stock record of an item.
    pub async fn get_stock(&self, item_id: ItemId) -> Result<StockRecord> {
        self.store
            .get_stock(item_id)
            .await?
            .ok_or(EngineError::NotFound { item_id })
    }

    /// Returns the reservation carrying `token`.
    pub async fn get_reservation(&self, token: &ReservationToken) -> Result<ReservationRecord> {
        self.load_reservation(token).await
    }

    async fn load_reservation(&self, token: &ReservationToken) -> Result<ReservationRecord> {
        if token.is_blank() {
            return Err(EngineError::InvalidToken(
                "token must not be blank".to_string(),
            ));
        }
        self.store
            .get_reservation(token)
            .await?
            .ok_or_else(|| EngineError::InvalidToken(token.to_string()))
    }

    async fn refresh_cache(&self, stock: &StockRecord) {
        let key = self.cache_key(stock.item_id());
        self.write_cache(&key, stock.available_quantity()).await;
    }

    async fn write_cache(&self, key: &str, available: u32) {
        if let Err(e) = self.cache.set(key, available).await {
            metrics::counter!("inventory_cache_errors_total").increment(1);
            tracing::warn!(key, error = %e, "cache write failed, entry left stale");
        }
    }
}
