//! Domain layer for the inventory reservation system.
//!
//! This crate provides the two records the reservation engine works on:
//! - [`StockRecord`]: per-item total/reserved quantities and a version stamp
//! - [`ReservationRecord`]: a claim against a stock record's available quantity
//!
//! All operations here are pure. Persistence and concurrency control live in
//! the store and engine crates.

pub mod error;
pub mod reservation;
pub mod stock;

pub use error::DomainError;
pub use reservation::{ReservationRecord, ReservationStatus};
pub use stock::StockRecord;
