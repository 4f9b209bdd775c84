pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{ItemId, RecordId, ReservationToken, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;
pub use store::{LookupStore, LookupStoreExt, StockWrite, WriteOptions, validate_write};
