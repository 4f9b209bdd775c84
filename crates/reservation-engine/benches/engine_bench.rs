use criterion::{Criterion, criterion_group, criterion_main};
use reservation_engine::{
    ApplySupply, CancelReservation, EngineConfig, InMemoryAvailabilityCache, ReservationEngine,
    ReserveItem,
};
use stock_store::{InMemoryStockStore, ItemId};

fn stocked_engine(
    rt: &tokio::runtime::Runtime,
) -> ReservationEngine<InMemoryStockStore, InMemoryAvailabilityCache> {
    let engine = ReservationEngine::new(
        InMemoryStockStore::new(),
        InMemoryAvailabilityCache::new(),
        EngineConfig::default(),
    );
    rt.block_on(async {
        engine
            .apply_supply(ApplySupply::new(ItemId::new(1), "Widget", 1_000))
            .await
            .unwrap();
    });
    engine
}

fn bench_reserve_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = stocked_engine(&rt);

    c.bench_function("engine/reserve_and_cancel", |b| {
        b.iter(|| {
            rt.block_on(async {
                let outcome = engine
                    .reserve(ReserveItem::new(ItemId::new(1), 1, "bench"))
                    .await
                    .unwrap();
                if let Some(token) = outcome.token() {
                    engine
                        .cancel(CancelReservation::new(token.clone()))
                        .await
                        .unwrap();
                }
            });
        });
    });
}

fn bench_cached_availability(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = stocked_engine(&rt);

    c.bench_function("engine/get_availability_cached", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine.get_availability(ItemId::new(1)).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_reserve_and_cancel, bench_cached_availability);
criterion_main!(benches);
