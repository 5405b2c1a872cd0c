use thiserror::Error;

use super::strategy::Strategy;
use std::collections::BTreeSet;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Validation failures for the related-products query surface. All of these
/// map to `InvalidArgument` at the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("page must be a positive integer")]
    InvalidPage,
    #[error("limit must be an integer between 1 and {MAX_LIMIT}")]
    InvalidLimit,
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("product id must be a positive integer")]
    InvalidProductId,
}

/// Validated query options for one related-products request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedParams {
    pub page: i64,
    pub limit: i64,
    /// Selected strategies, deduplicated, in priority order.
    pub strategies: Vec<Strategy>,
}

impl Default for RelatedParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            strategies: Strategy::ALL.to_vec(),
        }
    }
}

impl RelatedParams {
    /// Parses raw query-string values. Absent values take defaults; present
    /// values are validated strictly — out-of-range limits are an error, not
    /// clamped.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] on a non-positive page, a limit outside
    /// `[1, 100]`, or a strategy name outside the eight-name set.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        strategies: Option<&str>,
    ) -> Result<Self, ParamError> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => {
                let value: i64 = raw.trim().parse().map_err(|_| ParamError::InvalidPage)?;
                if value < 1 {
                    return Err(ParamError::InvalidPage);
                }
                value
            }
        };

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => {
                let value: i64 = raw.trim().parse().map_err(|_| ParamError::InvalidLimit)?;
                if !(1..=MAX_LIMIT).contains(&value) {
                    return Err(ParamError::InvalidLimit);
                }
                value
            }
        };

        let strategies = parse_strategies(strategies)?;

        Ok(Self {
            page,
            limit,
            strategies,
        })
    }
}

/// Expands the `strategies` parameter: absent or `all` selects every
/// strategy; otherwise a comma-separated list of known names.
fn parse_strategies(raw: Option<&str>) -> Result<Vec<Strategy>, ParamError> {
    let Some(raw) = raw else {
        return Ok(Strategy::ALL.to_vec());
    };

    let mut selected: BTreeSet<Strategy> = BTreeSet::new();
    for element in raw.split(',') {
        let element = element.trim();
        if element == "all" {
            return Ok(Strategy::ALL.to_vec());
        }
        match Strategy::parse(element) {
            Some(strategy) => {
                selected.insert(strategy);
            }
            None => return Err(ParamError::UnknownStrategy(element.to_string())),
        }
    }

    // BTreeSet iteration order is Strategy's Ord, i.e. priority order.
    Ok(selected.into_iter().collect())
}

/// Parses the path's product id as a positive integer.
///
/// # Errors
///
/// Returns [`ParamError::InvalidProductId`] for non-numeric or non-positive
/// input.
pub fn parse_product_id(raw: &str) -> Result<i64, ParamError> {
    let id: i64 = raw.trim().parse().map_err(|_| ParamError::InvalidProductId)?;
    if id < 1 {
        return Err(ParamError::InvalidProductId);
    }
    Ok(id)
}
