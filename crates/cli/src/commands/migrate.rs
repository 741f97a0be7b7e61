//! Database migration and connectivity commands.
//!
//! Migrations live in `crates/engine/migrations/` and are embedded into the
//! binary at compile time, so the CLI can run against a fresh database with
//! nothing but `ORDERLINE_DATABASE_URL` set.

use orderline_engine::config::{ConfigError, EngineConfig};
use orderline_engine::store::create_pool;
use tracing::info;

/// Errors from the migration commands.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns an error when the database URL is missing, the connection fails,
/// or a migration cannot be applied.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env()?;

    info!("Connecting to database...");
    let pool = create_pool(&config).await?;

    info!("Running migrations...");
    sqlx::migrate!("../engine/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}

/// Verify the database is reachable with the configured credentials.
///
/// # Errors
///
/// Returns an error when the database URL is missing or the round trip fails.
pub async fn ping() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env()?;
    let pool = create_pool(&config).await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    info!("Database reachable");
    Ok(())
}
