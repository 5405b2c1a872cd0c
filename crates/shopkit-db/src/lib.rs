use std::future::Future;
use std::time::Duration;

use shopkit_core::{AppConfig, Deadline};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/shopkit-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("query deadline exceeded")]
    DeadlineExceeded,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

/// Runs a store future under the remaining slice of `deadline`.
///
/// An already-expired deadline short-circuits without touching the pool;
/// expiry mid-query drops the in-flight future, which releases its
/// connection back to the pool.
pub(crate) async fn with_deadline<F, T>(deadline: Deadline, query: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let Some(remaining) = deadline.remaining() else {
        return Err(DbError::DeadlineExceeded);
    };
    match tokio::time::timeout(remaining, query).await {
        Ok(result) => result.map_err(DbError::from),
        Err(_) => Err(DbError::DeadlineExceeded),
    }
}

pub mod categories;
pub mod products;
pub mod related;
pub mod variants;

pub use categories::{
    get_category, list_categories_by_ids, list_category_ancestors, list_child_categories,
    list_sibling_categories, CategoryRow, ANCESTOR_DEPTH_LIMIT,
};
pub use products::{get_product, list_products_by_ids, ProductRow};
pub use related::{
    list_candidates_by_brand, list_candidates_by_price_overlap, list_candidates_by_tag_overlap,
    list_candidates_in_categories, list_scoring_facts, list_seller_popular, ScoringFactsRow,
    TagOverlapRow,
};
pub use variants::{list_option_previews, list_variants_for_products, OptionPreviewRow, VariantRow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }
}
