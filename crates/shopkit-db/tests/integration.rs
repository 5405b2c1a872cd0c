//! Offline unit tests for shopkit-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use rust_decimal::Decimal;
use shopkit_core::{AppConfig, Environment};
use shopkit_db::{CategoryRow, PoolConfig, ProductRow, ScoringFactsRow, VariantRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        related_deadline_ms: 5000,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    let row = ProductRow {
        id: 103_i64,
        seller_id: 2_i64,
        category_id: 4_i64,
        name: "Galaxy S24".to_string(),
        brand: "Samsung".to_string(),
        sku: "GS24-128".to_string(),
        tags: vec!["smartphone".to_string(), "5g".to_string()],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 103);
    assert_eq!(row.seller_id, 2);
    assert_eq!(row.brand, "Samsung");
    assert_eq!(row.tags.len(), 2);
}

#[test]
fn category_row_models_global_and_seller_owned() {
    let global = CategoryRow {
        id: 3,
        parent_id: None,
        seller_id: None,
        name: "Electronics".to_string(),
        is_active: true,
    };
    let owned = CategoryRow {
        id: 90,
        parent_id: Some(3),
        seller_id: Some(2),
        name: "Clearance".to_string(),
        is_active: false,
    };

    assert!(global.seller_id.is_none());
    assert_eq!(owned.parent_id, Some(3));
    assert!(!owned.is_active);
}

#[test]
fn variant_row_carries_decimal_price() {
    let row = VariantRow {
        id: 1,
        product_id: 103,
        sku: "GS24-128-BLK".to_string(),
        price: Decimal::new(79_999, 2),
        allow_purchase: true,
        is_default: true,
    };

    assert_eq!(row.price.to_string(), "799.99");
    assert!(row.is_default);
}

#[test]
fn scoring_facts_row_rolls_up_availability() {
    let row = ScoringFactsRow {
        product_id: 104,
        brand: "Samsung".to_string(),
        category_id: 4,
        tags: vec!["smartphone".to_string()],
        variant_count: 0,
        any_purchasable: false,
    };

    // Zero variants with no purchasable flag set is the "no penalty" shape.
    assert_eq!(row.variant_count, 0);
    assert!(!row.any_purchasable);
}
