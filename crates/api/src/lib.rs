//! HTTP API server with observability for the inventory reservation engine.
//!
//! Provides REST endpoints for supplying stock, reserving and cancelling
//! units, and reading availability, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use reservation_engine::{AvailabilityCache, EngineConfig, ReservationEngine};
use stock_store::LookupStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::inventory::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C>(state: Arc<AppState<S, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/inventory", post(routes::inventory::supply::<S, C>))
        .route("/inventory/reserve", post(routes::inventory::reserve::<S, C>))
        .route("/inventory/cancel", post(routes::inventory::cancel::<S, C>))
        .route("/inventory/{item_id}", get(routes::inventory::get::<S, C>))
        .route(
            "/inventory/{item_id}/availability",
            get(routes::inventory::availability::<S, C>),
        )
        .route(
            "/reservations/{token}",
            get(routes::inventory::reservation::<S, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a reservation engine.
pub fn create_default_state<S, C>(store: S, cache: C, config: EngineConfig) -> Arc<AppState<S, C>>
where
    S: LookupStore,
    C: AvailabilityCache,
{
    Arc::new(AppState {
        engine: ReservationEngine::new(store, cache, config),
    })
}
