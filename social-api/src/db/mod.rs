//! Database layer - connection pool and schema bootstrap
//!
//! Repositories live in [`crate::storage`]; this module only opens the pool
//! they share.

pub mod migrations;
pub mod pool;

pub use pool::{connect_options, create_pool, pool_options};
