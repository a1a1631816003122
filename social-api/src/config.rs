//! Startup configuration.
//!
//! Built once in `main` from the environment (after an optional `.env`
//! file has been loaded) and handed by value to the components that need it.

use std::time::Duration;

use tracing::{debug, info};

use crate::env;

pub const DEFAULT_ADDR: &str = ":8081";
pub const DEFAULT_DB_ADDR: &str =
    "host=db port=5432 user=admin password=adminpassword dbname=social sslmode=disable";
pub const DEFAULT_MAX_OPEN_CONNS: u32 = 10;
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 5;
pub const DEFAULT_MAX_IDLE_TIME: Duration = Duration::from_secs(60);

/// Database pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Connection string, key/value (`host=... dbname=...`) or URL form.
    pub addr: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub max_idle_time: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_DB_ADDR.to_owned(),
            max_open_conns: DEFAULT_MAX_OPEN_CONNS,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            max_idle_time: DEFAULT_MAX_IDLE_TIME,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Bind address; a bare `:port` binds every interface.
    pub addr: String,
    pub db: DbConfig,
    /// Apply the schema bootstrap before serving.
    pub auto_migrate: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            db: DbConfig::default(),
            auto_migrate: false,
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(env::process_env)
    }

    /// Read the configuration from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_idle_secs = env::int_from(
            &lookup,
            "DB_MAX_IDLE_TIME",
            DEFAULT_MAX_IDLE_TIME.as_secs() as i64,
        );

        Self {
            addr: env::string_from(&lookup, "ADDR", DEFAULT_ADDR),
            db: DbConfig {
                addr: env::string_from(&lookup, "DB_ADDR", DEFAULT_DB_ADDR),
                max_open_conns: positive_or(
                    env::int_from(&lookup, "DB_MAX_OPEN_CONNS", DEFAULT_MAX_OPEN_CONNS.into()),
                    DEFAULT_MAX_OPEN_CONNS,
                ),
                max_idle_conns: positive_or(
                    env::int_from(&lookup, "DB_MAX_IDLE_CONNS", DEFAULT_MAX_IDLE_CONNS.into()),
                    DEFAULT_MAX_IDLE_CONNS,
                ),
                max_idle_time: u64::try_from(max_idle_secs)
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_MAX_IDLE_TIME),
            },
            auto_migrate: env::int_from(&lookup, "DB_AUTO_MIGRATE", 0) == 1,
        }
    }
}

/// Values the pool cannot express (zero, negative, over `u32`) degrade to the default.
fn positive_or(value: i64, fallback: u32) -> u32 {
    u32::try_from(value)
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(fallback)
}

/// Load `.env` from the working directory if one exists.
///
/// Variables already present in the environment are not overridden.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded .env from {}", path.display()),
        Err(e) if e.not_found() => {
            info!("Using environment variables only (no .env file found)")
        }
        Err(e) => info!("Ignoring unreadable .env file: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config_from(&[]);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.addr, ":8081");
        assert_eq!(config.db.max_open_conns, 10);
        assert_eq!(config.db.max_idle_conns, 5);
        assert_eq!(config.db.max_idle_time, Duration::from_secs(60));
        assert!(config.db.addr.contains("sslmode=disable"));
        assert!(!config.auto_migrate);
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            ("ADDR", "127.0.0.1:9000"),
            ("DB_ADDR", "postgres://u:p@localhost/social"),
            ("DB_MAX_OPEN_CONNS", "20"),
            ("DB_MAX_IDLE_CONNS", "2"),
            ("DB_MAX_IDLE_TIME", "15"),
            ("DB_AUTO_MIGRATE", "1"),
        ]);

        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(config.db.addr, "postgres://u:p@localhost/social");
        assert_eq!(config.db.max_open_conns, 20);
        assert_eq!(config.db.max_idle_conns, 2);
        assert_eq!(config.db.max_idle_time, Duration::from_secs(15));
        assert!(config.auto_migrate);
    }

    #[test]
    fn malformed_and_unrepresentable_values_fall_back() {
        let config = config_from(&[
            ("DB_MAX_OPEN_CONNS", "lots"),
            ("DB_MAX_IDLE_CONNS", "-1"),
            ("DB_MAX_IDLE_TIME", "0"),
            ("DB_AUTO_MIGRATE", "yes"),
        ]);

        assert_eq!(config.db.max_open_conns, DEFAULT_MAX_OPEN_CONNS);
        assert_eq!(config.db.max_idle_conns, DEFAULT_MAX_IDLE_CONNS);
        assert_eq!(config.db.max_idle_time, DEFAULT_MAX_IDLE_TIME);
        assert!(!config.auto_migrate);
    }
}
