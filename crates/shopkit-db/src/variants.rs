//! Variant and option reads used for price ranges and variant previews.
//! Both accessors batch over a product-id set so enrichment never fans out
//! per candidate.

use rust_decimal::Decimal;
use shopkit_core::Deadline;
use sqlx::PgPool;

use crate::{with_deadline, DbError};

/// A row from the `product_variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub price: Decimal,
    pub allow_purchase: bool,
    pub is_default: bool,
}

/// One `(option, value)` pair realized by at least one variant of a product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptionPreviewRow {
    pub product_id: i64,
    pub name: String,
    pub display_name: String,
    pub position: i32,
    pub value: String,
}

/// All variants for a set of products, grouped by product in the row order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_variants_for_products(
    pool: &PgPool,
    deadline: Deadline,
    product_ids: &[i64],
) -> Result<Vec<VariantRow>, DbError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = sqlx::query_as::<_, VariantRow>(
        "SELECT id, product_id, sku, price, allow_purchase, is_default \
         FROM product_variants \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, id",
    )
    .bind(product_ids)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}

/// Option values actually present on some variant, for a set of products.
/// Values never linked to a variant are excluded from previews.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or
/// [`DbError::DeadlineExceeded`] when the budget runs out.
pub async fn list_option_previews(
    pool: &PgPool,
    deadline: Deadline,
    product_ids: &[i64],
) -> Result<Vec<OptionPreviewRow>, DbError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = sqlx::query_as::<_, OptionPreviewRow>(
        "SELECT o.product_id, o.name, o.display_name, o.position, ov.value \
         FROM product_options o \
         JOIN product_option_values ov ON ov.option_id = o.id \
         WHERE o.product_id = ANY($1) \
           AND EXISTS ( \
               SELECT 1 FROM variant_option_values vv \
               WHERE vv.option_value_id = ov.id \
           ) \
         ORDER BY o.product_id, o.position, o.id, ov.id",
    )
    .bind(product_ids)
    .fetch_all(pool);

    with_deadline(deadline, query).await
}
