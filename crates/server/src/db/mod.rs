//! Database access for the product catalog.
//!
//! The catalog is the only persisted collection; orders are transient and
//! invoices live on the filesystem. Queries use the sqlx runtime API so the
//! crate builds without a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run at startup
//! via [`run_migrations`].

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod products;

pub use products::{CatalogStore, InMemoryCatalogStore, PgCatalogStore};

/// Errors surfaced by the catalog store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row no longer satisfies a domain invariant.
    #[error("Data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run pending migrations from `crates/server/migrations/`.
///
/// # Errors
///
/// Returns an error if any migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
