//! HTTP server layer
//!
//! Axum server with:
//! - Panic recovery (500 instead of a crashed task)
//! - Request tracing
//! - Fixed timeouts: request head and body reads, response production,
//!   and idle keep-alive connections
//!
//! There is no graceful shutdown: the server runs until the listener fails.

pub mod listener;
pub mod routes;
pub mod server;

pub use listener::{DeadlineListener, DeadlineStream};
pub use server::{
    apply_middleware, build_router, run_server, serve, AppState, ServerConfig, ServerTimeouts,
};
