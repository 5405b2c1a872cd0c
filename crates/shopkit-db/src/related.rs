//! Candidate-generation and scoring-fact queries for the related-products
//! recommender. Every query filters by the scoped seller and excludes the
//! source product; a failing query fails the whole operation rather than
//! silently dropping a strategy.

use rust_decimal::Decimal;
use shopkit_core::{Deadline, TenantScope};
use sqlx::PgPool;

use crate::{with_deadline, DbError};

/// A candidate id with its tag overlap against the source product.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct TagOverlapRow {
    pub product_id: i64,
    pub overlap: i64,
}

/// Per-candidate attributes the scorer needs, aggregated in one query so the
/// merge step never fans out.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoringFactsRow {
    pub product_id: i64,
    pub brand: String,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub variant_count: i64,
    pub any_purchasable: bool,
}

/// Ids of the seller's products in any of `category_ids`.
///
/// Serves the `same_category`, `sibling_category`, `parent_category`, and
/// `child_category` generators, which differ only in which category set they
/// pass in.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_candidates_in_categories(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    category_ids: &[i64],
    exclude_product_id: i64,
) -> Result<Vec<i64>, DbError> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products \
         WHERE seller_id = $1 AND category_id = ANY($2) AND id <> $3 \
         ORDER BY id",
    )
    .bind(scope.seller_id())
    .bind(category_ids)
    .bind(exclude_product_id)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Ids of the seller's products with an exactly matching brand, outside the
/// source category (same-category products are already covered by the
/// higher-scoring generator). Brands compare after trimming on both sides,
/// matching the scorer's brand-equality predicate.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_candidates_by_brand(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    brand: &str,
    exclude_category_id: i64,
    exclude_product_id: i64,
) -> Result<Vec<i64>, DbError> {
    let query = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products \
         WHERE seller_id = $1 AND btrim(brand) = $2 AND category_id <> $3 AND id <> $4 \
         ORDER BY id",
    )
    .bind(scope.seller_id())
    .bind(brand.trim())
    .bind(exclude_category_id)
    .bind(exclude_product_id)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Products sharing at least one tag with the source, with the size of the
/// set intersection. Duplicate tags on either side count once.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_candidates_by_tag_overlap(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    tags: &[String],
    exclude_product_id: i64,
) -> Result<Vec<TagOverlapRow>, DbError> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let query = sqlx::query_as::<_, TagOverlapRow>(
        "SELECT p.id AS product_id, \
                (SELECT COUNT(DISTINCT t) FROM unnest(p.tags) AS t \
                 WHERE t = ANY($2)) AS overlap \
         FROM products p \
         WHERE p.seller_id = $1 AND p.id <> $3 AND p.tags && $2 \
         ORDER BY p.id",
    )
    .bind(scope.seller_id())
    .bind(tags)
    .bind(exclude_product_id)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Products whose price range overlaps `[lower, upper]`.
///
/// A product's range is taken over purchasable variants, falling back to all
/// variants when none allow purchase; products without variants have no
/// range and never match.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_candidates_by_price_overlap(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    lower: Decimal,
    upper: Decimal,
    exclude_product_id: i64,
) -> Result<Vec<i64>, DbError> {
    let query = sqlx::query_scalar::<_, i64>(
        "SELECT p.id \
         FROM products p \
         JOIN LATERAL ( \
             SELECT MIN(v.price) AS min_price, MAX(v.price) AS max_price \
             FROM product_variants v \
             WHERE v.product_id = p.id \
               AND (v.allow_purchase OR NOT EXISTS ( \
                   SELECT 1 FROM product_variants w \
                   WHERE w.product_id = p.id AND w.allow_purchase \
               )) \
         ) pr ON pr.min_price IS NOT NULL \
         WHERE p.seller_id = $1 AND p.id <> $2 \
           AND pr.min_price <= $4 AND pr.max_price >= $3 \
         ORDER BY p.id",
    )
    .bind(scope.seller_id())
    .bind(exclude_product_id)
    .bind(lower)
    .bind(upper)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Up to `limit` of the seller's other products, newest first.
///
/// The popularity proxy is recency: `created_at DESC, id ASC`. The catalog
/// records no sales counters, so recency is the deterministic stand-in.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_seller_popular(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    exclude_product_id: i64,
    limit: i64,
) -> Result<Vec<i64>, DbError> {
    let query = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products \
         WHERE seller_id = $1 AND id <> $2 \
         ORDER BY created_at DESC, id ASC \
         LIMIT $3",
    )
    .bind(scope.seller_id())
    .bind(exclude_product_id)
    .bind(limit)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Batched scoring facts for a candidate set: brand, category, tags, and
/// variant availability rolled up per product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_scoring_facts(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    product_ids: &[i64],
) -> Result<Vec<ScoringFactsRow>, DbError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = sqlx::query_as::<_, ScoringFactsRow>(
        "SELECT p.id AS product_id, p.brand, p.category_id, p.tags, \
                COUNT(v.id) AS variant_count, \
                COALESCE(BOOL_OR(v.allow_purchase), FALSE) AS any_purchasable \
         FROM products p \
         LEFT JOIN product_variants v ON v.product_id = p.id \
         WHERE p.seller_id = $1 AND p.id = ANY($2) \
         GROUP BY p.id",
    )
    .bind(scope.seller_id())
    .bind(product_ids)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}
