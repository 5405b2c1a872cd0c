//! GET /api/products/{id}/related — the related-products query coordinator.
//!
//! Validates input, loads the source product (the single tenant check),
//! drives the selected strategies, merges and ranks candidates, paginates,
//! and enriches the requested page. Read-only and safe to retry.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use shopkit_core::related::{
    average_score, contributing_strategies, merge_and_rank, page_slice, paginate, parse_product_id,
    tag_matching_score, Candidate, CandidateFacts, Pagination, RankedCandidate, RelatedParams,
    SourceFacts, SourceShape, Strategy, SELLER_POPULAR_LIMIT,
};
use shopkit_core::{Deadline, PriceRange, TenantScope};
use shopkit_db::{CategoryRow, DbError, ProductRow};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState, SellerId};

#[derive(Debug, Deserialize)]
pub(super) struct RelatedQuery {
    /// Raw strings so validation errors surface as `INVALID_ARGUMENT`
    /// rather than axum deserialization rejections.
    pub page: Option<String>,
    pub limit: Option<String>,
    pub strategies: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RelatedResponse {
    related_products: Vec<RelatedProductBody>,
    pagination: PaginationBody,
    meta: MetaBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelatedProductBody {
    id: i64,
    name: String,
    seller_id: i64,
    brand: String,
    sku: String,
    tags: Vec<String>,
    category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<CategoryBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_range: Option<PriceRangeBody>,
    has_variants: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    variant_preview: Option<VariantPreviewBody>,
    score: i64,
    strategy_used: &'static str,
    relation_reason: &'static str,
}

#[derive(Debug, Serialize)]
struct CategoryBody {
    id: i64,
    name: String,
}

#[derive(Debug, Serialize)]
struct PriceRangeBody {
    min: Decimal,
    max: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VariantPreviewBody {
    total_variants: i64,
    options: Vec<OptionBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionBody {
    name: String,
    display_name: String,
    available_values: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaginationBody {
    current_page: i64,
    total_pages: i64,
    total_items: i64,
    items_per_page: i64,
    has_next: bool,
    has_prev: bool,
}

impl From<Pagination> for PaginationBody {
    fn from(p: Pagination) -> Self {
        Self {
            current_page: p.current_page,
            total_pages: p.total_pages,
            total_items: p.total_items,
            items_per_page: p.items_per_page,
            has_next: p.has_next,
            has_prev: p.has_prev,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaBody {
    strategies_used: Vec<&'static str>,
    total_strategies: usize,
    avg_score: f64,
}

pub(super) async fn get_related_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    SellerId(scope): SellerId,
    Path(raw_id): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> Result<Json<RelatedResponse>, ApiError> {
    // Validation runs before any store access.
    let source_id =
        parse_product_id(&raw_id).map_err(|e| ApiError::invalid_argument(e.to_string()))?;
    let params = RelatedParams::parse(
        query.page.as_deref(),
        query.limit.as_deref(),
        query.strategies.as_deref(),
    )
    .map_err(|e| ApiError::invalid_argument(e.to_string()))?;

    let deadline = Deadline::after(Duration::from_millis(state.related_deadline_ms));
    let store_err = |e: DbError| map_db_error(&req_id.0, &e);

    // The only tenant check: an absent product and a foreign product are the
    // same NotFound. Every later query filters by seller independently.
    let source = shopkit_db::get_product(&state.pool, scope, deadline, source_id)
        .await
        .map_err(store_err)?
        .ok_or_else(ApiError::not_found)?;

    let source_category = shopkit_db::get_category(&state.pool, scope, deadline, source.category_id)
        .await
        .map_err(store_err)?;
    let source_variants =
        shopkit_db::list_variants_for_products(&state.pool, deadline, &[source.id])
            .await
            .map_err(store_err)?;
    let source_range =
        PriceRange::from_variants(source_variants.iter().map(|v| (v.price, v.allow_purchase)));

    let shape = SourceShape {
        has_brand: !source.brand.trim().is_empty(),
        has_parent_category: source_category.as_ref().is_some_and(|c| c.parent_id.is_some()),
        has_tags: !source.tags.is_empty(),
        has_price_range: source_range.is_some(),
    };

    let mut tuples: Vec<Candidate> = Vec::new();
    for strategy in &params.strategies {
        if !strategy.can_apply(shape) {
            continue;
        }
        gather_candidates(
            &state.pool,
            scope,
            deadline,
            *strategy,
            &source,
            source_category.as_ref(),
            source_range,
            &mut tuples,
        )
        .await
        .map_err(store_err)?;
    }

    let mut candidate_ids: Vec<i64> = tuples.iter().map(|c| c.product_id).collect();
    candidate_ids.sort_unstable();
    candidate_ids.dedup();

    let facts: HashMap<i64, CandidateFacts> =
        shopkit_db::list_scoring_facts(&state.pool, scope, deadline, &candidate_ids)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(|row| {
                (
                    row.product_id,
                    CandidateFacts {
                        brand: row.brand,
                        category_id: row.category_id,
                        tags: row.tags,
                        has_variants: row.variant_count > 0,
                        any_purchasable: row.any_purchasable,
                    },
                )
            })
            .collect();

    let source_facts = SourceFacts {
        product_id: source.id,
        brand: source.brand.trim().to_string(),
        category_id: source.category_id,
        tags: source.tags.clone(),
    };
    let ranked = merge_and_rank(&tuples, &source_facts, &facts);

    let total_items = i64::try_from(ranked.len()).unwrap_or(i64::MAX);
    let pagination = paginate(total_items, params.page, params.limit);
    let page_items = page_slice(&ranked, params.page, params.limit);

    let related_products = enrich_page(&state.pool, scope, deadline, page_items)
        .await
        .map_err(store_err)?;

    let strategies_used = contributing_strategies(&tuples, source.id);

    Ok(Json(RelatedResponse {
        related_products,
        pagination: pagination.into(),
        meta: MetaBody {
            strategies_used: strategies_used.iter().map(|s| s.name()).collect(),
            total_strategies: Strategy::COUNT,
            avg_score: average_score(&ranked),
        },
    }))
}

/// Runs one strategy's store query and appends its tuples. A query failure
/// fails the whole operation; strategies are never silently dropped.
#[allow(clippy::too_many_arguments)]
async fn gather_candidates(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    strategy: Strategy,
    source: &ProductRow,
    source_category: Option<&CategoryRow>,
    source_range: Option<PriceRange>,
    out: &mut Vec<Candidate>,
) -> Result<(), DbError> {
    let push_fixed = |out: &mut Vec<Candidate>, ids: Vec<i64>| {
        out.extend(ids.into_iter().map(|product_id| Candidate {
            product_id,
            strategy,
            base_score: strategy.base_score(),
        }));
    };

    match strategy {
        Strategy::SameCategory => {
            let ids = shopkit_db::list_candidates_in_categories(
                pool,
                scope,
                deadline,
                &[source.category_id],
                source.id,
            )
            .await?;
            push_fixed(out, ids);
        }
        Strategy::SameBrand => {
            let ids = shopkit_db::list_candidates_by_brand(
                pool,
                scope,
                deadline,
                source.brand.trim(),
                source.category_id,
                source.id,
            )
            .await?;
            push_fixed(out, ids);
        }
        Strategy::SiblingCategory => {
            let Some(parent_id) = source_category.and_then(|c| c.parent_id) else {
                return Ok(());
            };
            let siblings = shopkit_db::list_sibling_categories(
                pool,
                scope,
                deadline,
                parent_id,
                source.category_id,
            )
            .await?;
            let ids = shopkit_db::list_candidates_in_categories(
                pool, scope, deadline, &siblings, source.id,
            )
            .await?;
            push_fixed(out, ids);
        }
        Strategy::ParentCategory => {
            let Some(parent_id) = source_category.and_then(|c| c.parent_id) else {
                return Ok(());
            };
            let ids = shopkit_db::list_candidates_in_categories(
                pool,
                scope,
                deadline,
                &[parent_id],
                source.id,
            )
            .await?;
            push_fixed(out, ids);
        }
        Strategy::ChildCategory => {
            let children =
                shopkit_db::list_child_categories(pool, scope, deadline, source.category_id)
                    .await?;
            let ids = shopkit_db::list_candidates_in_categories(
                pool, scope, deadline, &children, source.id,
            )
            .await?;
            push_fixed(out, ids);
        }
        Strategy::TagMatching => {
            let rows = shopkit_db::list_candidates_by_tag_overlap(
                pool,
                scope,
                deadline,
                &source.tags,
                source.id,
            )
            .await?;
            out.extend(rows.into_iter().map(|row| Candidate {
                product_id: row.product_id,
                strategy,
                base_score: tag_matching_score(usize::try_from(row.overlap).unwrap_or(1)),
            }));
        }
        Strategy::PriceRange => {
            let Some(range) = source_range else {
                return Ok(());
            };
            let (lower, upper) = range.similarity_band();
            let ids = shopkit_db::list_candidates_by_price_overlap(
                pool, scope, deadline, lower, upper, source.id,
            )
            .await?;
            push_fixed(out, ids);
        }
        Strategy::SellerPopular => {
            let ids = shopkit_db::list_seller_popular(
                pool,
                scope,
                deadline,
                source.id,
                SELLER_POPULAR_LIMIT,
            )
            .await?;
            push_fixed(out, ids);
        }
    }

    Ok(())
}

/// Enriches one page of ranked candidates with display fields. All lookups
/// batch over the page's id set; a candidate deleted mid-flight is dropped
/// from the page rather than failing the request.
async fn enrich_page(
    pool: &PgPool,
    scope: TenantScope,
    deadline: Deadline,
    page: &[RankedCandidate],
) -> Result<Vec<RelatedProductBody>, DbError> {
    let ids: Vec<i64> = page.iter().map(|c| c.product_id).collect();

    let products = shopkit_db::list_products_by_ids(pool, scope, deadline, &ids).await?;
    let mut category_ids: Vec<i64> = products.iter().map(|p| p.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    let categories = shopkit_db::list_categories_by_ids(pool, scope, deadline, &category_ids).await?;
    let variants = shopkit_db::list_variants_for_products(pool, deadline, &ids).await?;
    let option_rows = shopkit_db::list_option_previews(pool, deadline, &ids).await?;

    let product_map: HashMap<i64, ProductRow> =
        products.into_iter().map(|p| (p.id, p)).collect();
    let category_names: HashMap<i64, String> =
        categories.into_iter().map(|c| (c.id, c.name)).collect();

    let mut variant_map: HashMap<i64, Vec<(Decimal, bool)>> = HashMap::new();
    for variant in variants {
        variant_map
            .entry(variant.product_id)
            .or_default()
            .push((variant.price, variant.allow_purchase));
    }

    let mut option_map: HashMap<i64, Vec<OptionBody>> = HashMap::new();
    for row in option_rows {
        let options = option_map.entry(row.product_id).or_default();
        match options.iter_mut().find(|o| o.name == row.name) {
            Some(option) => option.available_values.push(row.value),
            None => options.push(OptionBody {
                name: row.name,
                display_name: row.display_name,
                available_values: vec![row.value],
            }),
        }
    }

    let mut enriched = Vec::with_capacity(page.len());
    for candidate in page {
        let Some(product) = product_map.get(&candidate.product_id) else {
            continue;
        };

        let product_variants = variant_map.get(&product.id).map_or(&[][..], Vec::as_slice);
        let has_variants = !product_variants.is_empty();
        let price_range = PriceRange::from_variants(product_variants.iter().copied())
            .map(|range| PriceRangeBody {
                min: range.min,
                max: range.max,
            });
        let variant_preview = has_variants.then(|| VariantPreviewBody {
            total_variants: i64::try_from(product_variants.len()).unwrap_or(i64::MAX),
            options: option_map.remove(&product.id).unwrap_or_default(),
        });

        enriched.push(RelatedProductBody {
            id: product.id,
            name: product.name.clone(),
            seller_id: product.seller_id,
            brand: product.brand.clone(),
            sku: product.sku.clone(),
            tags: product.tags.clone(),
            category_id: product.category_id,
            category: category_names.get(&product.category_id).map(|name| CategoryBody {
                id: product.category_id,
                name: name.clone(),
            }),
            price_range,
            has_variants,
            variant_preview,
            score: candidate.score,
            strategy_used: candidate.strategy.name(),
            relation_reason: candidate.reason,
        });
    }

    Ok(enriched)
}
