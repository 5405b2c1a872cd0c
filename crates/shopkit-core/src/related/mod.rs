//! Domain logic for the related-products recommender: the eight candidate
//! strategies, option parsing, cross-strategy scoring, and pagination math.
//! Everything here is pure; catalog I/O lives in `shopkit-db`.

mod page;
mod params;
mod score;
mod strategy;

pub use page::{page_slice, paginate, Pagination};
pub use params::{
    parse_product_id, ParamError, RelatedParams, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT,
};
pub use score::{
    average_score, contributing_strategies, merge_and_rank, Candidate, CandidateFacts,
    RankedCandidate, SourceFacts, MIN_SCORE,
};
pub use strategy::{tag_matching_score, SourceShape, Strategy, SELLER_POPULAR_LIMIT};
