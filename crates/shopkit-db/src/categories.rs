//! Category tree reads. Categories are either global (`seller_id IS NULL`)
//! or owned by one seller; every read filters to what the scoped seller may
//! see.

use shopkit_core::{Deadline, TenantScope};
use sqlx::PgPool;

use crate::{with_deadline, DbError};

/// Upper bound on ancestor traversal, so pathological parent chains cannot
/// stall a request.
pub const ANCESTOR_DEPTH_LIMIT: i32 = 16;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub name: String,
    pub is_active: bool,
}

const CATEGORY_COLUMNS: &str = "id, parent_id, seller_id, name, is_active";

/// Fetches one category visible to the scoped seller (global or own).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn get_category(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    category_id: i64,
) -> Result<Option<CategoryRow>, DbError> {
    let sql = format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories \
         WHERE id = $1 AND (seller_id IS NULL OR seller_id = $2)"
    );
    let query = sqlx::query_as::<_, CategoryRow>(&sql)
    .bind(category_id)
    .bind(scope.seller_id())
    .fetch_optional(pool);

    with_deadline(deadline, query).await
}

/// Batch-fetches categories by id for enrichment.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_categories_by_ids(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    ids: &[i64],
) -> Result<Vec<CategoryRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories \
         WHERE id = ANY($1) AND (seller_id IS NULL OR seller_id = $2)"
    );
    let query = sqlx::query_as::<_, CategoryRow>(&sql)
    .bind(ids)
    .bind(scope.seller_id())
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Walks from a category up to its root, bounded at
/// [`ANCESTOR_DEPTH_LIMIT`] levels. The starting category is the first row;
/// the root is last.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_category_ancestors(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    category_id: i64,
) -> Result<Vec<CategoryRow>, DbError> {
    let query = sqlx::query_as::<_, CategoryRow>(
        "WITH RECURSIVE chain AS ( \
             SELECT id, parent_id, seller_id, name, is_active, 0 AS depth \
             FROM categories \
             WHERE id = $1 AND (seller_id IS NULL OR seller_id = $2) \
             UNION ALL \
             SELECT c.id, c.parent_id, c.seller_id, c.name, c.is_active, chain.depth + 1 \
             FROM categories c \
             JOIN chain ON c.id = chain.parent_id \
             WHERE chain.depth < $3 \
         ) \
         SELECT id, parent_id, seller_id, name, is_active \
         FROM chain \
         ORDER BY depth",
    )
    .bind(category_id)
    .bind(scope.seller_id())
    .bind(ANCESTOR_DEPTH_LIMIT)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Ids of active categories sharing `parent_id`, excluding the category the
/// traversal started from.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_sibling_categories(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    parent_id: i64,
    exclude_category_id: i64,
) -> Result<Vec<i64>, DbError> {
    let query = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM categories \
         WHERE parent_id = $1 AND id <> $2 AND is_active \
           AND (seller_id IS NULL OR seller_id = $3) \
         ORDER BY id",
    )
    .bind(parent_id)
    .bind(exclude_category_id)
    .bind(scope.seller_id())
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Ids of active direct children of a category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_child_categories(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    category_id: i64,
) -> Result<Vec<i64>, DbError> {
    let query = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM categories \
         WHERE parent_id = $1 AND is_active \
           AND (seller_id IS NULL OR seller_id = $2) \
         ORDER BY id",
    )
    .bind(category_id)
    .bind(scope.seller_id())
    .fetch_all(pool);

    with_deadline(deadline, query).await
}
