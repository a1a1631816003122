//! social-api binary
//!
//! Startup: tracing → `.env` → configuration → wait for the database →
//! pool → storage → serve. Any failure along the way is fatal.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use social_api::db::{create_pool, migrations};
use social_api::http::{run_server, ServerConfig};
use social_api::{config, tracing_setup, AppConfig, Storage};

/// Grace period for a co-located database container to come up.
const STARTUP_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = tracing_setup::init_tracing() {
        eprintln!("Failed to initialize tracing: {:#}", e);
        return ExitCode::FAILURE;
    }
    config::load_dotenv();

    report(run().await)
}

/// Log a fatal error exactly once and map the outcome to an exit code.
fn report(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env();
    tracing::info!(addr = %config.addr, "Starting application");

    tracing::info!("Waiting {:?} for database to be ready...", STARTUP_DELAY);
    tokio::time::sleep(STARTUP_DELAY).await;

    let pool = create_pool(&config.db)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection established");

    if config.auto_migrate {
        migrations::run(&pool)
            .await
            .context("Failed to apply schema migrations")?;
    }

    let storage = Storage::new(pool);

    run_server(storage, ServerConfig::from(&config))
        .await
        .context("Server error")?;

    Ok(())
}
