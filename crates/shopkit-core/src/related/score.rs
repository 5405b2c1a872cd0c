use std::collections::{BTreeMap, HashMap};

use crate::catalog::tag_overlap;

use super::strategy::Strategy;

/// Bonus for each additional strategy that also produced a candidate.
pub const MULTI_STRATEGY_BONUS: i64 = 10;
/// Bonus when the candidate matches both the source brand and category.
pub const BRAND_CATEGORY_BONUS: i64 = 50;
/// Per-shared-tag bonus, applied only when the overlap is at least two.
pub const TAG_BONUS_PER_MATCH: i64 = 5;
pub const TAG_BONUS_CAP: i64 = 25;
/// Penalty when every variant of the candidate refuses purchase.
pub const OUT_OF_STOCK_PENALTY: i64 = 50;
/// Scores are clamped so every emitted candidate stays positive.
pub const MIN_SCORE: i64 = 1;

/// One `(candidate, strategy, base score)` tuple emitted by a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub product_id: i64,
    pub strategy: Strategy,
    pub base_score: i64,
}

/// Source-product attributes that drive cross-strategy bonuses.
#[derive(Debug, Clone)]
pub struct SourceFacts {
    pub product_id: i64,
    /// Trimmed; empty means the product has no brand.
    pub brand: String,
    pub category_id: i64,
    pub tags: Vec<String>,
}

/// Candidate attributes fetched in one batched store query.
#[derive(Debug, Clone)]
pub struct CandidateFacts {
    pub brand: String,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub has_variants: bool,
    pub any_purchasable: bool,
}

/// A deduplicated, scored candidate in the final ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    pub product_id: i64,
    pub score: i64,
    pub strategy: Strategy,
    pub reason: &'static str,
}

/// Deduplicates the strategy output, applies bonuses and penalties, and
/// produces the total order `(score desc, strategy priority, id asc)`.
///
/// `facts` should cover every candidate id; a candidate missing from it
/// (deleted mid-flight) keeps its strategy-derived score without bonuses.
#[must_use]
pub fn merge_and_rank(
    candidates: &[Candidate],
    source: &SourceFacts,
    facts: &HashMap<i64, CandidateFacts>,
) -> Vec<RankedCandidate> {
    // Per candidate: best base score per strategy, keyed in priority order.
    let mut groups: HashMap<i64, BTreeMap<Strategy, i64>> = HashMap::new();
    for candidate in candidates {
        if candidate.product_id == source.product_id {
            continue;
        }
        let per_strategy = groups.entry(candidate.product_id).or_default();
        let entry = per_strategy.entry(candidate.strategy).or_insert(i64::MIN);
        *entry = (*entry).max(candidate.base_score);
    }

    let source_brand = source.brand.trim();

    let mut ranked: Vec<RankedCandidate> = groups
        .into_iter()
        .map(|(product_id, per_strategy)| {
            // Highest base score wins; BTreeMap iteration breaks ties by
            // strategy priority.
            let (&chosen, &chosen_base) = per_strategy
                .iter()
                .max_by_key(|(strategy, base)| (*base, std::cmp::Reverse(*strategy)))
                .unwrap_or_else(|| unreachable!("group is never empty"));

            let extra_strategies = i64::try_from(per_strategy.len() - 1).unwrap_or(0);
            let mut score = chosen_base + MULTI_STRATEGY_BONUS * extra_strategies;

            if let Some(candidate_facts) = facts.get(&product_id) {
                if !source_brand.is_empty()
                    && candidate_facts.brand.trim() == source_brand
                    && candidate_facts.category_id == source.category_id
                {
                    score += BRAND_CATEGORY_BONUS;
                }

                let overlap = tag_overlap(&source.tags, &candidate_facts.tags);
                if overlap >= 2 {
                    let overlap = i64::try_from(overlap).unwrap_or(i64::MAX);
                    score += (TAG_BONUS_PER_MATCH * overlap).min(TAG_BONUS_CAP);
                }

                if candidate_facts.has_variants && !candidate_facts.any_purchasable {
                    score -= OUT_OF_STOCK_PENALTY;
                }
            }

            RankedCandidate {
                product_id,
                score: score.max(MIN_SCORE),
                strategy: chosen,
                reason: chosen.reason(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.strategy.cmp(&b.strategy))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    ranked
}

/// Strategies that contributed at least one candidate to the ranked list,
/// in priority order.
#[must_use]
pub fn contributing_strategies(candidates: &[Candidate], source_id: i64) -> Vec<Strategy> {
    let mut present: Vec<Strategy> = Vec::new();
    for strategy in Strategy::ALL {
        if candidates
            .iter()
            .any(|c| c.strategy == strategy && c.product_id != source_id)
        {
            present.push(strategy);
        }
    }
    present
}

/// Arithmetic mean of the final scores, `0.0` for an empty ranking.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_score(ranked: &[RankedCandidate]) -> f64 {
    if ranked.is_empty() {
        return 0.0;
    }
    let total: i64 = ranked.iter().map(|c| c.score).sum();
    total as f64 / ranked.len() as f64
}
