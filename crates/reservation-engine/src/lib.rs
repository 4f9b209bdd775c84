//! Reservation engine for the inventory service.
//!
//! The engine coordinates the durable lookup store and the derived
//! availability cache. Stock records are mutated under optimistic
//! concurrency: every write is conditional on the version that was read,
//! and reservations absorb lost races with a bounded retry loop.
//!
//! # Example
//!
//! ```no_run
//! use reservation_engine::{
//!     ApplySupply, EngineConfig, InMemoryAvailabilityCache, ReservationEngine, ReserveItem,
//! };
//! use stock_store::{InMemoryStockStore, ItemId};
//!
//! # async fn example() -> reservation_engine::Result<()> {
//! let engine = ReservationEngine::new(
//!     InMemoryStockStore::new(),
//!     InMemoryAvailabilityCache::new(),
//!     EngineConfig::default(),
//! );
//!
//! engine.apply_supply(ApplySupply::new(ItemId::new(1), "Widget", 10)).await?;
//! let outcome = engine.reserve(ReserveItem::new(ItemId::new(1), 6, "user1")).await?;
//! assert!(outcome.token().is_some());
//! assert_eq!(engine.get_availability(ItemId::new(1)).await?, 4);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;

pub use cache::{AvailabilityCache, CacheError, InMemoryAvailabilityCache, RedisAvailabilityCache};
pub use commands::{ApplySupply, CancelReservation, ReserveItem};
pub use config::EngineConfig;
pub use engine::ReservationEngine;
pub use error::{EngineError, ErrorKind, Result};
pub use outcome::{CancelOutcome, ReserveOutcome, SupplyReceipt};
