/// The eight candidate generators, declared in merge tie-break priority order
/// (highest first). `#[derive(Ord)]` therefore sorts by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    SameCategory,
    SameBrand,
    SiblingCategory,
    ParentCategory,
    ChildCategory,
    TagMatching,
    PriceRange,
    SellerPopular,
}

/// Cap applied to the dynamic `tag_matching` base score.
const TAG_MATCHING_MAX_SCORE: i64 = 60;

/// Row cap for the `seller_popular` generator.
pub const SELLER_POPULAR_LIMIT: i64 = 50;

/// What a generator needs to know about the source product before it can run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceShape {
    /// Brand is nonempty after trimming.
    pub has_brand: bool,
    /// The source category has a parent.
    pub has_parent_category: bool,
    /// The source product carries at least one tag.
    pub has_tags: bool,
    /// The source product has a defined price range.
    pub has_price_range: bool,
}

impl Strategy {
    /// All strategies, in priority order. This is the expansion of the
    /// `all` selector.
    pub const ALL: [Strategy; 8] = [
        Strategy::SameCategory,
        Strategy::SameBrand,
        Strategy::SiblingCategory,
        Strategy::ParentCategory,
        Strategy::ChildCategory,
        Strategy::TagMatching,
        Strategy::PriceRange,
        Strategy::SellerPopular,
    ];

    pub const COUNT: usize = Self::ALL.len();

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Strategy::SameCategory => "same_category",
            Strategy::SameBrand => "same_brand",
            Strategy::SiblingCategory => "sibling_category",
            Strategy::ParentCategory => "parent_category",
            Strategy::ChildCategory => "child_category",
            Strategy::TagMatching => "tag_matching",
            Strategy::PriceRange => "price_range",
            Strategy::SellerPopular => "seller_popular",
        }
    }

    /// Parses one element of the `strategies` query parameter.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.name() == s)
    }

    /// Fixed starting weight. `tag_matching` is the one strategy whose base
    /// score depends on the candidate; see [`tag_matching_score`]. The value
    /// here is its floor (overlap of exactly one tag).
    #[must_use]
    pub fn base_score(self) -> i64 {
        match self {
            Strategy::SameCategory => 100,
            Strategy::SameBrand => 80,
            Strategy::SiblingCategory => 70,
            Strategy::ParentCategory => 60,
            Strategy::ChildCategory => 50,
            Strategy::TagMatching | Strategy::PriceRange => 20,
            Strategy::SellerPopular => 15,
        }
    }

    /// Merge tie-break rank; lower wins.
    #[must_use]
    pub fn priority(self) -> u8 {
        self as u8
    }

    /// User-visible explanation for why a candidate surfaced.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Strategy::SameCategory => "In the same category as the source product",
            Strategy::SameBrand => "Same brand as the source product",
            Strategy::SiblingCategory => "In a sibling category of the source product",
            Strategy::ParentCategory => "In the parent category of the source product",
            Strategy::ChildCategory => "In a child category of the source product",
            Strategy::TagMatching => "Shares tags with the source product",
            Strategy::PriceRange => "Priced similarly to the source product",
            Strategy::SellerPopular => "Popular with this seller",
        }
    }

    /// Whether the generator has anything to work with for this source.
    /// Strategies that cannot apply are skipped, not failed.
    #[must_use]
    pub fn can_apply(self, shape: SourceShape) -> bool {
        match self {
            Strategy::SameCategory | Strategy::ChildCategory | Strategy::SellerPopular => true,
            Strategy::SameBrand => shape.has_brand,
            Strategy::SiblingCategory | Strategy::ParentCategory => shape.has_parent_category,
            Strategy::TagMatching => shape.has_tags,
            Strategy::PriceRange => shape.has_price_range,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Base score for a `tag_matching` candidate: `20 + 10·(overlap − 1)`,
/// capped at 60. Callers guarantee `overlap >= 1` (the store query only
/// returns products sharing a tag).
#[must_use]
pub fn tag_matching_score(overlap: usize) -> i64 {
    let overlap = i64::try_from(overlap.max(1)).unwrap_or(i64::MAX);
    (20 + 10 * (overlap - 1)).min(TAG_MATCHING_MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_eight_strategies_in_priority_order() {
        assert_eq!(Strategy::COUNT, 8);
        let priorities: Vec<u8> = Strategy::ALL.iter().map(|s| s.priority()).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn names_round_trip_through_parse() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::parse(strategy.name()), Some(strategy));
        }
        assert_eq!(Strategy::parse("ml_magic"), None);
        assert_eq!(Strategy::parse("SAME_CATEGORY"), None);
    }

    #[test]
    fn base_scores_match_the_fixed_table() {
        assert_eq!(Strategy::SameCategory.base_score(), 100);
        assert_eq!(Strategy::SameBrand.base_score(), 80);
        assert_eq!(Strategy::SiblingCategory.base_score(), 70);
        assert_eq!(Strategy::ParentCategory.base_score(), 60);
        assert_eq!(Strategy::ChildCategory.base_score(), 50);
        assert_eq!(Strategy::TagMatching.base_score(), 20);
        assert_eq!(Strategy::PriceRange.base_score(), 20);
        assert_eq!(Strategy::SellerPopular.base_score(), 15);
    }

    #[test]
    fn tag_matching_score_scales_with_overlap_and_caps() {
        assert_eq!(tag_matching_score(1), 20);
        assert_eq!(tag_matching_score(2), 30);
        assert_eq!(tag_matching_score(5), 60);
        assert_eq!(tag_matching_score(9), 60);
    }

    #[test]
    fn conditional_strategies_respect_source_shape() {
        let bare = SourceShape::default();
        assert!(Strategy::SameCategory.can_apply(bare));
        assert!(Strategy::SellerPopular.can_apply(bare));
        assert!(!Strategy::SameBrand.can_apply(bare));
        assert!(!Strategy::SiblingCategory.can_apply(bare));
        assert!(!Strategy::ParentCategory.can_apply(bare));
        assert!(!Strategy::TagMatching.can_apply(bare));
        assert!(!Strategy::PriceRange.can_apply(bare));

        let full = SourceShape {
            has_brand: true,
            has_parent_category: true,
            has_tags: true,
            has_price_range: true,
        };
        for strategy in Strategy::ALL {
            assert!(strategy.can_apply(full), "{strategy} should apply");
        }
    }

    #[test]
    fn ord_follows_priority() {
        assert!(Strategy::SameCategory < Strategy::SameBrand);
        assert!(Strategy::PriceRange < Strategy::SellerPopular);
    }
}
