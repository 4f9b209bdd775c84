//! Integration tests for the reservation engine over the in-memory store.

use std::sync::Arc;

use futures_util::future::join_all;
use reservation_engine::{
    ApplySupply, AvailabilityCache, CancelOutcome, CancelReservation, EngineConfig, EngineError,
    ErrorKind, InMemoryAvailabilityCache, ReservationEngine, ReserveItem, ReserveOutcome,
};
use stock_store::{InMemoryStockStore, ItemId, LookupStore, LookupStoreExt};

type Engine = ReservationEngine<InMemoryStockStore, InMemoryAvailabilityCache>;

fn engine_with(config: EngineConfig) -> Engine {
    ReservationEngine::new(
        InMemoryStockStore::new(),
        InMemoryAvailabilityCache::new(),
        config,
    )
}

fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

async fn stocked(quantity: u32) -> Engine {
    let engine = engine();
    engine
        .apply_supply(ApplySupply::new(ItemId::new(1), "Widget", quantity))
        .await
        .unwrap();
    engine
}

/// Asserts the cache entry matches what the store says is available.
async fn assert_cache_consistent(engine: &Engine, item_id: ItemId) {
    let stock = engine.store().get_stock(item_id).await.unwrap().unwrap();
    let cached = engine.cache().peek(&engine.cache_key(item_id)).await;
    assert_eq!(cached, Some(stock.available_quantity()));
}

/// Asserts active reservations add up to the reserved counter and never
/// exceed the total.
async fn assert_reservations_balance(engine: &Engine, item_id: ItemId) {
    let stock = engine.store().get_stock(item_id).await.unwrap().unwrap();
    let outstanding = engine.store().outstanding_quantity(item_id).await.unwrap();
    assert_eq!(outstanding, u64::from(stock.reserved_quantity()));
    assert!(outstanding <= u64::from(stock.total_quantity()));
}

#[tokio::test]
async fn test_worked_example() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    assert_eq!(engine.get_availability(item).await.unwrap(), 10);

    let first = engine
        .reserve(ReserveItem::new(item, 6, "user1"))
        .await
        .unwrap();
    let token = first.token().unwrap().clone();
    assert_eq!(engine.get_availability(item).await.unwrap(), 4);

    let second = engine
        .reserve(ReserveItem::new(item, 5, "user2"))
        .await
        .unwrap();
    assert_eq!(second, ReserveOutcome::InsufficientStock { available: 4 });
    assert_eq!(engine.get_availability(item).await.unwrap(), 4);

    let cancelled = engine.cancel(CancelReservation::new(token)).await.unwrap();
    assert_eq!(cancelled, CancelOutcome::Cancelled);
    assert_eq!(engine.get_availability(item).await.unwrap(), 10);

    let missing = engine.get_availability(ItemId::new(999)).await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_reserve_cancel_round_trip_restores_availability() {
    let engine = stocked(7).await;
    let item = ItemId::new(1);
    let before = engine.get_stock(item).await.unwrap();

    let token = engine
        .reserve(ReserveItem::new(item, 3, "user1"))
        .await
        .unwrap()
        .token()
        .unwrap()
        .clone();
    engine.cancel(CancelReservation::new(token)).await.unwrap();

    let after = engine.get_stock(item).await.unwrap();
    assert_eq!(after.available_quantity(), before.available_quantity());
    assert_eq!(after.reserved_quantity(), 0);
    assert!(after.version() > before.version());
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    let token = engine
        .reserve(ReserveItem::new(item, 4, "user1"))
        .await
        .unwrap()
        .token()
        .unwrap()
        .clone();

    let first = engine.cancel(CancelReservation::new(token.clone())).await.unwrap();
    let after_first = engine.get_stock(item).await.unwrap();
    let second = engine.cancel(CancelReservation::new(token.clone())).await.unwrap();
    let third = engine.cancel(CancelReservation::new(token)).await.unwrap();

    assert_eq!(first, CancelOutcome::Cancelled);
    assert_eq!(second, CancelOutcome::AlreadyCancelled);
    assert_eq!(third, CancelOutcome::AlreadyCancelled);
    assert_eq!(engine.get_stock(item).await.unwrap(), after_first);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserves_never_oversell() {
    const TASKS: u32 = 10;
    const QUANTITY: u32 = 3;

    // Each lost race means another task committed, so TASKS attempts
    // always suffice.
    let engine = Arc::new(engine_with(EngineConfig::default().with_max_attempts(TASKS)));
    let item = ItemId::new(1);
    engine
        .apply_supply(ApplySupply::new(item, "Widget", (TASKS - 1) * QUANTITY))
        .await
        .unwrap();

    let handles = (0..TASKS).map(|i| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .reserve(ReserveItem::new(item, QUANTITY, format!("user{i}")))
                .await
        })
    });
    let outcomes: Vec<ReserveOutcome> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let reserved = outcomes.iter().filter(|o| o.is_reserved()).count();
    let rejected = outcomes
        .iter()
        .filter(|o| matches!(o, ReserveOutcome::InsufficientStock { .. }))
        .count();
    assert_eq!(reserved, (TASKS - 1) as usize);
    assert_eq!(rejected, 1);

    let stock = engine.get_stock(item).await.unwrap();
    assert_eq!(stock.available_quantity(), 0);
    assert_eq!(engine.store().reservation_count().await, (TASKS - 1) as usize);
    assert_reservations_balance(&engine, item).await;
    assert_cache_consistent(&engine, item).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_release_once() {
    let engine = Arc::new(stocked(10).await);
    let item = ItemId::new(1);
    let token = engine
        .reserve(ReserveItem::new(item, 6, "user1"))
        .await
        .unwrap()
        .token()
        .unwrap()
        .clone();

    let handles = (0..5).map(|_| {
        let engine = Arc::clone(&engine);
        let token = token.clone();
        tokio::spawn(async move { engine.cancel(CancelReservation::new(token)).await })
    });
    let outcomes: Vec<CancelOutcome> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let cancelled = outcomes
        .iter()
        .filter(|o| **o == CancelOutcome::Cancelled)
        .count();
    assert_eq!(cancelled, 1);

    let stock = engine.get_stock(item).await.unwrap();
    assert_eq!(stock.reserved_quantity(), 0);
    assert_eq!(stock.available_quantity(), 10);
}

#[tokio::test]
async fn test_reserve_retries_after_lost_race() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    engine.store().inject_concurrent_writes(2).await;

    let outcome = engine
        .reserve(ReserveItem::new(item, 2, "user1"))
        .await
        .unwrap();

    assert!(outcome.is_reserved());
    assert_eq!(engine.get_stock(item).await.unwrap().reserved_quantity(), 2);
}

#[tokio::test]
async fn test_reserve_gives_up_after_retry_budget() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    engine.store().inject_concurrent_writes(3).await;

    let err = engine
        .reserve(ReserveItem::new(item, 2, "user1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::ContentionExhausted { attempts: 3, .. }
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(engine.store().reservation_count().await, 0);
    assert_eq!(engine.get_stock(item).await.unwrap().reserved_quantity(), 0);
}

#[tokio::test]
async fn test_retry_budget_is_configurable() {
    let engine = engine_with(EngineConfig::default().with_max_attempts(1));
    let item = ItemId::new(1);
    engine
        .apply_supply(ApplySupply::new(item, "Widget", 10))
        .await
        .unwrap();
    engine.store().inject_concurrent_writes(1).await;

    let err = engine
        .reserve(ReserveItem::new(item, 1, "user1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::ContentionExhausted { attempts: 1, .. }
    ));
}

#[tokio::test]
async fn test_insufficient_stock_is_not_retried() {
    let engine = stocked(2).await;
    let item = ItemId::new(1);
    let reads_before = engine.store().stock_reads();

    let outcome = engine
        .reserve(ReserveItem::new(item, 3, "user1"))
        .await
        .unwrap();

    assert_eq!(outcome, ReserveOutcome::InsufficientStock { available: 2 });
    assert_eq!(engine.store().stock_reads(), reads_before + 1);
}

#[tokio::test]
async fn test_cancel_retries_after_lost_race() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    let token = engine
        .reserve(ReserveItem::new(item, 4, "user1"))
        .await
        .unwrap()
        .token()
        .unwrap()
        .clone();
    engine.store().inject_concurrent_writes(1).await;

    let outcome = engine.cancel(CancelReservation::new(token)).await.unwrap();

    assert_eq!(outcome, CancelOutcome::Cancelled);
    assert_eq!(engine.get_stock(item).await.unwrap().available_quantity(), 10);
}

#[tokio::test]
async fn test_cache_tracks_every_mutation() {
    let engine = engine();
    let item = ItemId::new(1);

    engine
        .apply_supply(ApplySupply::new(item, "Widget", 8))
        .await
        .unwrap();
    assert_cache_consistent(&engine, item).await;

    let token = engine
        .reserve(ReserveItem::new(item, 5, "user1"))
        .await
        .unwrap()
        .token()
        .unwrap()
        .clone();
    assert_cache_consistent(&engine, item).await;

    engine
        .apply_supply(ApplySupply::new(item, "Widget", 2))
        .await
        .unwrap();
    assert_cache_consistent(&engine, item).await;

    engine.cancel(CancelReservation::new(token)).await.unwrap();
    assert_cache_consistent(&engine, item).await;
    assert_eq!(engine.cache().peek("inventory_availability:1").await, Some(10));
}

#[tokio::test]
async fn test_cache_outage_degrades_to_store() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    engine.cache().set_unavailable(true).await;

    let outcome = engine
        .reserve(ReserveItem::new(item, 3, "user1"))
        .await
        .unwrap();
    assert!(outcome.is_reserved());
    assert_eq!(engine.get_availability(item).await.unwrap(), 7);

    // The entry written before the outage is stale now; the next
    // mutation after recovery overwrites it.
    engine.cache().set_unavailable(false).await;
    assert_eq!(engine.cache().get("inventory_availability:1").await.unwrap(), Some(10));
    engine
        .reserve(ReserveItem::new(item, 1, "user1"))
        .await
        .unwrap();
    assert_cache_consistent(&engine, item).await;
}

#[tokio::test]
async fn test_store_outage_aborts_operations() {
    let engine = stocked(10).await;
    engine.store().set_unavailable(true).await;

    let err = engine
        .reserve(ReserveItem::new(ItemId::new(1), 1, "user1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    let err = engine
        .apply_supply(ApplySupply::new(ItemId::new(1), "Widget", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[tokio::test]
async fn test_cancel_with_missing_stock_is_integrity_error() {
    let engine = stocked(10).await;
    let item = ItemId::new(1);
    let token = engine
        .reserve(ReserveItem::new(item, 4, "user1"))
        .await
        .unwrap()
        .token()
        .unwrap()
        .clone();
    engine.store().remove_stock(item).await;

    let err = engine
        .cancel(CancelReservation::new(token.clone()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(engine.get_reservation(&token).await.unwrap().is_active());
}

#[tokio::test]
async fn test_mixed_operations_keep_reservations_balanced() {
    let engine = stocked(20).await;
    let item = ItemId::new(1);
    let mut tokens = Vec::new();

    for quantity in [3, 5, 7, 9, 2] {
        let outcome = engine
            .reserve(ReserveItem::new(item, quantity, "user1"))
            .await
            .unwrap();
        if let Some(token) = outcome.token() {
            tokens.push(token.clone());
        }
        assert_reservations_balance(&engine, item).await;
    }

    engine
        .apply_supply(ApplySupply::new(item, "Widget", 4))
        .await
        .unwrap();
    assert_reservations_balance(&engine, item).await;

    for token in tokens.iter().step_by(2) {
        engine
            .cancel(CancelReservation::new(token.clone()))
            .await
            .unwrap();
        assert_reservations_balance(&engine, item).await;
    }

    let history = engine.store().reservations_for_item(item).await.unwrap();
    assert_eq!(history.len(), tokens.len());
}
