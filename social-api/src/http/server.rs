//! Axum server setup
//!
//! Router construction, the middleware stack applied to every request, and
//! the serving loop.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use super::listener::DeadlineListener;
use super::routes;
use crate::config::AppConfig;
use crate::storage::Storage;
use crate::Result;

/// Connection timeouts. Fixed policy, not read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeouts {
    /// Budget for receiving a request head, then again for its body.
    pub read: Duration,
    /// Budget for producing a response (408 when exceeded).
    pub write: Duration,
    /// Keep-alive connections with no traffic are closed after this.
    pub idle: Duration,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(10),
            write: Duration::from_secs(30),
            idle: Duration::from_secs(60),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, `host:port` or `:port`
    pub addr: String,
    pub timeouts: ServerTimeouts,
}

impl ServerConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeouts: ServerTimeouts::default(),
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.addr.clone())
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, timeouts: &ServerTimeouts) -> Router {
    let router = Router::new().nest("/v1", routes::v1_router());

    apply_middleware(router, timeouts).with_state(Arc::new(state))
}

/// Wrap every route of `router` in the request middleware.
///
/// Outermost first: tracing, panic recovery, response deadline, body deadline.
pub fn apply_middleware<S>(router: Router<S>, timeouts: &ServerTimeouts) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeouts.write,
        ))
        .layer(RequestBodyTimeoutLayer::new(timeouts.read));

    router.layer(middleware)
}

/// Turn Go-style `:port` addresses into something `bind` accepts.
pub fn resolve_bind_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_owned()
    }
}

/// Run the HTTP server.
///
/// Only returns on failure; there is no shutdown path.
///
/// # Example
///
/// ```ignore
/// let storage = Storage::new(create_pool(&config.db).await?);
/// run_server(storage, ServerConfig::from(&config)).await?;
/// ```
pub async fn run_server(storage: Storage, config: ServerConfig) -> Result<()> {
    let app = build_router(AppState::new(storage), &config.timeouts);

    let bind_addr = resolve_bind_addr(&config.addr);
    let tcp = TcpListener::bind(bind_addr.as_str()).await?;
    tracing::info!(
        read_timeout = ?config.timeouts.read,
        write_timeout = ?config.timeouts.write,
        idle_timeout = ?config.timeouts.idle,
        "Starting server on {}",
        config.addr
    );

    serve(tcp, app, &config.timeouts).await
}

/// Serve `app` on an already bound listener, enforcing the connection
/// read and idle deadlines.
pub async fn serve(tcp: TcpListener, app: Router, timeouts: &ServerTimeouts) -> Result<()> {
    let listener = DeadlineListener::new(tcp, timeouts.read, timeouts.idle);
    axum::serve(listener, app).await?;

    Ok(())
}
