//! HTTP route handlers.

pub mod inventory;
pub mod system;
