//! Live integration tests for shopkit-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/shopkit-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::time::Duration;

use rust_decimal::Decimal;
use shopkit_core::{Deadline, TenantScope};
use shopkit_db::{
    get_category, get_product, list_candidates_by_brand, list_candidates_by_price_overlap,
    list_candidates_by_tag_overlap, list_candidates_in_categories, list_category_ancestors,
    list_child_categories, list_option_previews, list_scoring_facts, list_seller_popular,
    list_sibling_categories, list_variants_for_products, DbError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scope(seller_id: i64) -> TenantScope {
    TenantScope::new(seller_id).expect("positive seller id")
}

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(10))
}

async fn insert_seller(pool: &sqlx::PgPool, id: i64, name: &str) {
    sqlx::query("INSERT INTO sellers (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .expect("insert seller");
}

async fn insert_category(
    pool: &sqlx::PgPool,
    id: i64,
    parent_id: Option<i64>,
    seller_id: Option<i64>,
    name: &str,
    is_active: bool,
) {
    sqlx::query(
        "INSERT INTO categories (id, parent_id, seller_id, name, is_active) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(parent_id)
    .bind(seller_id)
    .bind(name)
    .bind(is_active)
    .execute(pool)
    .await
    .expect("insert category");
}

async fn insert_product(
    pool: &sqlx::PgPool,
    id: i64,
    seller_id: i64,
    category_id: i64,
    name: &str,
    brand: &str,
    tags: &[&str],
) {
    let tags: Vec<String> = tags.iter().map(ToString::to_string).collect();
    sqlx::query(
        "INSERT INTO products (id, seller_id, category_id, name, brand, sku, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(seller_id)
    .bind(category_id)
    .bind(name)
    .bind(brand)
    .bind(format!("SKU-{id}"))
    .bind(tags)
    .execute(pool)
    .await
    .expect("insert product");
}

async fn insert_variant(
    pool: &sqlx::PgPool,
    id: i64,
    product_id: i64,
    price: &str,
    allow_purchase: bool,
    is_default: bool,
) {
    sqlx::query(
        "INSERT INTO product_variants (id, product_id, sku, price, allow_purchase, is_default) \
         VALUES ($1, $2, $3, $4::numeric(10,2), $5, $6)",
    )
    .bind(id)
    .bind(product_id)
    .bind(format!("VSKU-{id}"))
    .bind(price)
    .bind(allow_purchase)
    .bind(is_default)
    .execute(pool)
    .await
    .expect("insert variant");
}

/// Two sellers sharing a global category tree, with enough products to
/// exercise every generator.
async fn seed_catalog(pool: &sqlx::PgPool) {
    insert_seller(pool, 2, "Acme Electronics").await;
    insert_seller(pool, 3, "Rival Gadgets").await;

    insert_category(pool, 3, None, None, "Electronics", true).await;
    insert_category(pool, 4, Some(3), None, "Smartphones", true).await;
    insert_category(pool, 5, Some(3), None, "Tablets", true).await;
    insert_category(pool, 6, Some(4), None, "Phone Accessories", true).await;
    insert_category(pool, 7, Some(3), None, "Discontinued", false).await;

    insert_product(pool, 101, 2, 4, "iPhone 15", "Apple", &["smartphone", "apple", "5g"]).await;
    insert_product(pool, 103, 2, 4, "Galaxy S24", "Samsung", &["smartphone", "samsung", "5g"]).await;
    insert_product(pool, 104, 2, 4, "Galaxy S23", "Samsung", &["smartphone", "samsung"]).await;
    insert_product(pool, 105, 2, 5, "Galaxy Tab S9", "Samsung", &["tablet", "samsung"]).await;
    insert_product(pool, 143, 2, 6, "Travel Charger", "Anker", &["charger", "usb-c"]).await;
    insert_product(pool, 301, 3, 4, "Galaxy S24 Grey", "Samsung", &["smartphone", "samsung"]).await;

    insert_variant(pool, 1, 103, "799.99", true, true).await;
    insert_variant(pool, 2, 103, "899.99", true, false).await;
    insert_variant(pool, 3, 104, "699.99", false, true).await;
    insert_variant(pool, 4, 105, "999.99", true, true).await;
    insert_variant(pool, 5, 143, "29.99", true, true).await;
}

// ---------------------------------------------------------------------------
// Tenant isolation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn get_product_hides_other_sellers_rows(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let own = get_product(&pool, scope(2), deadline(), 103)
        .await
        .expect("query");
    assert_eq!(own.map(|p| p.name), Some("Galaxy S24".to_string()));

    let foreign = get_product(&pool, scope(3), deadline(), 103)
        .await
        .expect("query");
    assert!(foreign.is_none(), "seller 3 must not see seller 2's product");

    let absent = get_product(&pool, scope(2), deadline(), 99_999)
        .await
        .expect("query");
    assert!(absent.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn candidate_queries_never_cross_sellers(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let ids = list_candidates_in_categories(&pool, scope(2), deadline(), &[4], 103)
        .await
        .expect("query");
    assert_eq!(ids, vec![101, 104], "301 belongs to seller 3");

    let brand = list_candidates_by_brand(&pool, scope(2), deadline(), "Samsung", 4, 103)
        .await
        .expect("query");
    assert_eq!(brand, vec![105], "same-category Samsung rows are excluded");
}

#[sqlx::test(migrations = "../../migrations")]
async fn brand_candidates_match_after_trimming(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    // A brand stored with stray whitespace still matches, the same equality
    // the scorer applies when granting the brand bonus.
    insert_product(&pool, 106, 2, 5, "Galaxy Tab S8", "Samsung ", &["tablet"]).await;

    let brand = list_candidates_by_brand(&pool, scope(2), deadline(), "Samsung", 4, 103)
        .await
        .expect("query");
    assert_eq!(brand, vec![105, 106]);

    let padded = list_candidates_by_brand(&pool, scope(2), deadline(), " Samsung ", 4, 103)
        .await
        .expect("query");
    assert_eq!(padded, brand, "caller-side padding is also trimmed");
}

// ---------------------------------------------------------------------------
// Category graph
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ancestors_walk_to_the_root_in_order(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let chain = list_category_ancestors(&pool, scope(2), deadline(), 6)
        .await
        .expect("query");
    let ids: Vec<i64> = chain.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![6, 4, 3]);
    assert!(chain.last().expect("root").parent_id.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn ancestor_traversal_is_depth_bounded(pool: sqlx::PgPool) {
    insert_seller(&pool, 2, "Acme").await;
    // A 40-deep chain; traversal must stop at the bound, not walk it all.
    for depth in 0..40_i64 {
        let parent = (depth > 0).then(|| 1000 + depth - 1);
        insert_category(&pool, 1000 + depth, parent, None, "Deep", true).await;
    }

    let chain = list_category_ancestors(&pool, scope(2), deadline(), 1039)
        .await
        .expect("query");
    assert_eq!(chain.len(), 17, "start category plus sixteen ancestors");
}

#[sqlx::test(migrations = "../../migrations")]
async fn siblings_and_children_skip_inactive_categories(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let siblings = list_sibling_categories(&pool, scope(2), deadline(), 3, 4)
        .await
        .expect("query");
    assert_eq!(siblings, vec![5], "inactive category 7 is skipped");

    let children = list_child_categories(&pool, scope(2), deadline(), 4)
        .await
        .expect("query");
    assert_eq!(children, vec![6]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_category_sees_global_rows(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let category = get_category(&pool, scope(2), deadline(), 4)
        .await
        .expect("query")
        .expect("category 4");
    assert_eq!(category.name, "Smartphones");
    assert_eq!(category.parent_id, Some(3));
}

// ---------------------------------------------------------------------------
// Tag, price, and popularity candidates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn tag_overlap_counts_distinct_shared_tags(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let tags = vec!["smartphone".to_string(), "samsung".to_string(), "5g".to_string()];
    let rows = list_candidates_by_tag_overlap(&pool, scope(2), deadline(), &tags, 103)
        .await
        .expect("query");

    let overlaps: Vec<(i64, i64)> = rows.iter().map(|r| (r.product_id, r.overlap)).collect();
    assert_eq!(overlaps, vec![(101, 2), (104, 2), (105, 1)]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn price_overlap_uses_purchasable_range_with_fallback(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    // Window that covers 104's only (unpurchasable, so fallback) variant.
    let rows = list_candidates_by_price_overlap(
        &pool,
        scope(2),
        deadline(),
        Decimal::new(60_000, 2),
        Decimal::new(85_000, 2),
        103,
    )
    .await
    .expect("query");
    assert_eq!(rows, vec![104], "variantless products never match");
}

#[sqlx::test(migrations = "../../migrations")]
async fn seller_popular_is_newest_first_and_capped(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    // Give 143 a strictly newer created_at than the seeded rows.
    sqlx::query("UPDATE products SET created_at = NOW() + INTERVAL '1 hour' WHERE id = 143")
        .execute(&pool)
        .await
        .expect("bump created_at");

    let rows = list_seller_popular(&pool, scope(2), deadline(), 103, 3)
        .await
        .expect("query");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], 143, "newest product ranks first");
    assert!(!rows.contains(&103), "source product is excluded");
}

#[sqlx::test(migrations = "../../migrations")]
async fn scoring_facts_aggregate_variants(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let rows = list_scoring_facts(&pool, scope(2), deadline(), &[101, 103, 104])
        .await
        .expect("query");
    assert_eq!(rows.len(), 3);

    let find = |id: i64| rows.iter().find(|r| r.product_id == id).expect("row");
    assert_eq!(find(101).variant_count, 0);
    assert!(!find(101).any_purchasable);
    assert_eq!(find(103).variant_count, 2);
    assert!(find(103).any_purchasable);
    assert_eq!(find(104).variant_count, 1);
    assert!(!find(104).any_purchasable, "104's only variant is blocked");
}

// ---------------------------------------------------------------------------
// Variants and option previews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn variants_batch_by_product_set(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let rows = list_variants_for_products(&pool, deadline(), &[103, 104])
        .await
        .expect("query");
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|v| v.product_id == 103 || v.product_id == 104));
    assert_eq!(rows[0].price, Decimal::new(79_999, 2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn option_previews_only_list_realized_values(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let option_id: i64 = sqlx::query_scalar(
        "INSERT INTO product_options (product_id, name, display_name, position) \
         VALUES (103, 'color', 'Color', 0) RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .expect("insert option");

    let black: i64 = sqlx::query_scalar(
        "INSERT INTO product_option_values (option_id, value) VALUES ($1, 'Black') RETURNING id",
    )
    .bind(option_id)
    .fetch_one(&pool)
    .await
    .expect("insert value");

    // 'Violet' exists as an option value but no variant realizes it.
    sqlx::query("INSERT INTO product_option_values (option_id, value) VALUES ($1, 'Violet')")
        .bind(option_id)
        .execute(&pool)
        .await
        .expect("insert unrealized value");

    sqlx::query("INSERT INTO variant_option_values (variant_id, option_value_id) VALUES (1, $1)")
        .bind(black)
        .execute(&pool)
        .await
        .expect("link variant");

    let rows = list_option_previews(&pool, deadline(), &[103])
        .await
        .expect("query");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "color");
    assert_eq!(rows[0].display_name, "Color");
    assert_eq!(rows[0].value, "Black");
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn expired_deadline_fails_before_querying(pool: sqlx::PgPool) {
    seed_catalog(&pool).await;

    let expired = Deadline::after(Duration::ZERO);
    let result = get_product(&pool, scope(2), expired, 103).await;
    assert!(matches!(result, Err(DbError::DeadlineExceeded)));
}
