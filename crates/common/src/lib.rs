//! Shared identifier and version types.
//!
//! Every crate in the workspace speaks in these types so that item keys,
//! storage keys, reservation tokens and version stamps can never be mixed up.

pub mod types;
pub mod version;

pub use types::{ItemId, RecordId, ReservationToken};
pub use version::Version;
