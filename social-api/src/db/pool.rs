//! Database connection pool management
//!
//! Uses sqlx PgPool sized from [`DbConfig`]. The pool is opened eagerly so a
//! bad address or an unreachable server surfaces at startup.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use crate::config::DbConfig;

/// How long to wait for the first connection before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the address cannot be parsed or the first
/// connection cannot be established.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&config.db).await?;
/// ```
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let options = connect_options(&config.addr)?;
    let pool = pool_options(config).connect_with(options).await?;

    tracing::info!(
        max_open = config.max_open_conns,
        max_idle = config.max_idle_conns,
        idle_secs = config.max_idle_time.as_secs(),
        "Database pool ready"
    );
    Ok(pool)
}

/// Pool sizing. sqlx has no idle-connection cap, so `max_idle_conns` is only
/// logged; idle connections are reaped after `max_idle_time` and none are
/// held open when there is no load.
pub fn pool_options(config: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(0)
        .idle_timeout(config.max_idle_time)
        .acquire_timeout(CONNECT_TIMEOUT)
}

/// Parse either a `postgres://` URL or a libpq key/value string
/// (`host=db port=5432 user=admin dbname=social sslmode=disable`).
pub fn connect_options(addr: &str) -> Result<PgConnectOptions, sqlx::Error> {
    if addr.contains("://") {
        return PgConnectOptions::from_str(addr);
    }

    let mut options = PgConnectOptions::new();
    for pair in addr.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| config_error(format!("expected key=value, got '{}'", pair)))?;

        options = match key {
            "host" => options.host(value),
            "port" => options.port(
                value
                    .parse()
                    .map_err(|_| config_error(format!("invalid port '{}'", value)))?,
            ),
            "user" => options.username(value),
            "password" => options.password(value),
            "dbname" => options.database(value),
            "sslmode" => options.ssl_mode(PgSslMode::from_str(value)?),
            "application_name" => options.application_name(value),
            other => return Err(config_error(format!("unsupported parameter '{}'", other))),
        };
    }
    Ok(options)
}

fn config_error(message: String) -> sqlx::Error {
    sqlx::Error::Configuration(message.into())
}
