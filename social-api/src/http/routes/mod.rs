//! Route handlers organized by resource

pub mod health;

use axum::Router;

/// Routes mounted under `/v1`.
pub fn v1_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().merge(health::router())
}
