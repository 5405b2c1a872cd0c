//! Seller-scoped reads of the `products` table.

use chrono::{DateTime, Utc};
use shopkit_core::{Deadline, TenantScope};
use sqlx::PgPool;

use crate::{with_deadline, DbError};

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub seller_id: i64,
    pub category_id: i64,
    pub name: String,
    /// Empty string means the product carries no brand.
    pub brand: String,
    pub sku: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str =
    "id, seller_id, category_id, name, brand, sku, tags, created_at, updated_at";

/// Fetches one product owned by the scoped seller.
///
/// Returns `None` both when the id does not exist and when it belongs to
/// another seller; callers cannot distinguish the two, which is what keeps
/// cross-tenant existence unleakable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn get_product(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    product_id: i64,
) -> Result<Option<ProductRow>, DbError> {
    let sql =
        format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 AND id = $2");
    let query = sqlx::query_as::<_, ProductRow>(&sql)
    .bind(scope.seller_id())
    .bind(product_id)
    .fetch_optional(pool);

    with_deadline(deadline, query).await
}

/// Batch-fetches products by id for enrichment, still filtered by seller as
/// defense in depth. Order is unspecified; callers re-order by rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_products_by_ids(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    ids: &[i64],
) -> Result<Vec<ProductRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql =
        format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 AND id = ANY($2)");
    let query = sqlx::query_as::<_, ProductRow>(&sql)
    .bind(scope.seller_id())
    .bind(ids)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}
