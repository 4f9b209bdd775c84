//! API server entry point.

use api::config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use reservation_engine::{AvailabilityCache, InMemoryAvailabilityCache, RedisAvailabilityCache};
use stock_store::{InMemoryStockStore, LookupStore, PostgresStockStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the application around the given backends and serves it.
async fn serve<S, C>(config: &Config, store: S, cache: C, metrics_handle: PrometheusHandle)
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let state = api::create_default_state(store, cache, config.engine_config());
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn serve_with_cache<S>(config: &Config, store: S, metrics_handle: PrometheusHandle)
where
    S: LookupStore + 'static,
{
    match &config.redis_url {
        Some(url) => {
            let cache = RedisAvailabilityCache::connect(url)
                .await
                .expect("failed to connect to Redis");
            serve(config, store, cache, metrics_handle).await;
        }
        None => {
            tracing::info!("REDIS_URL not set, using in-memory availability cache");
            serve(config, store, InMemoryAvailabilityCache::new(), metrics_handle).await;
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the store and cache backends, then serve
    match &config.database_url {
        Some(url) => {
            let store = PostgresStockStore::connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            serve_with_cache(&config, store, metrics_handle).await;
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory stock store");
            serve_with_cache(&config, InMemoryStockStore::new(), metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
