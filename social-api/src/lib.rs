//! social-api: HTTP service skeleton for posts and users
//!
//! Exposes a liveness endpoint and a repository-style storage layer
//! (`Storage` over `PostRepository` and `UserRepository`) backed by
//! PostgreSQL.

pub mod config;
pub mod db;
pub mod env;
pub mod error;
pub mod http;
pub mod storage;
pub mod tracing_setup;

pub use config::{AppConfig, DbConfig};
pub use error::{Error, Result};
pub use storage::{Post, PostRepository, Storage, StorageError, User, UserRepository};
