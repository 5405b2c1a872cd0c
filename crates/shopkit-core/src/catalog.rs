use std::collections::HashSet;

use rust_decimal::Decimal;

/// Min/max price across a product's variants.
///
/// Computed over purchasable variants when any exist, otherwise over all
/// variants. A product with no variants has no price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Derives the range from `(price, allow_purchase)` pairs.
    ///
    /// Zero is a legitimate price (free samples) and participates like any
    /// other value.
    #[must_use]
    pub fn from_variants<I>(variants: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Decimal, bool)>,
    {
        let all: Vec<(Decimal, bool)> = variants.into_iter().collect();
        if all.is_empty() {
            return None;
        }

        let purchasable: Vec<Decimal> = all
            .iter()
            .filter(|(_, allow)| *allow)
            .map(|(price, _)| *price)
            .collect();
        let prices: Vec<Decimal> = if purchasable.is_empty() {
            all.iter().map(|(price, _)| *price).collect()
        } else {
            purchasable
        };

        let min = prices.iter().copied().min()?;
        let max = prices.iter().copied().max()?;
        Some(Self { min, max })
    }

    #[must_use]
    pub fn midpoint(self) -> Decimal {
        (self.min + self.max) / Decimal::from(2)
    }

    /// Price window considered "similar" to this range: `[0.75·mid, 1.25·mid]`.
    #[must_use]
    pub fn similarity_band(self) -> (Decimal, Decimal) {
        let mid = self.midpoint();
        (mid * Decimal::new(75, 2), mid * Decimal::new(125, 2))
    }
}

/// Number of exact-equal tokens shared by two tag lists, with duplicates
/// folded to set semantics.
#[must_use]
pub fn tag_overlap(a: &[String], b: &[String]) -> usize {
    let left: HashSet<&str> = a.iter().map(String::as_str).collect();
    let right: HashSet<&str> = b.iter().map(String::as_str).collect();
    left.intersection(&right).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn price_range_prefers_purchasable_variants() {
        let range = PriceRange::from_variants(vec![
            (dec("10.00"), true),
            (dec("99.00"), false),
            (dec("12.00"), true),
        ])
        .expect("range");
        assert_eq!(range.min, dec("10.00"));
        assert_eq!(range.max, dec("12.00"));
    }

    #[test]
    fn price_range_falls_back_to_all_variants() {
        let range = PriceRange::from_variants(vec![(dec("5.00"), false), (dec("8.00"), false)])
            .expect("range");
        assert_eq!(range.min, dec("5.00"));
        assert_eq!(range.max, dec("8.00"));
    }

    #[test]
    fn price_range_is_undefined_without_variants() {
        assert!(PriceRange::from_variants(Vec::new()).is_none());
    }

    #[test]
    fn price_range_includes_zero_priced_variants() {
        let range =
            PriceRange::from_variants(vec![(dec("0.00"), true), (dec("4.00"), true)]).expect("range");
        assert_eq!(range.min, dec("0.00"));
        assert_eq!(range.midpoint(), dec("2.00"));
    }

    #[test]
    fn similarity_band_brackets_the_midpoint() {
        let range =
            PriceRange::from_variants(vec![(dec("80.00"), true), (dec("120.00"), true)]).expect("range");
        let (lower, upper) = range.similarity_band();
        assert_eq!(lower, dec("75.0000"));
        assert_eq!(upper, dec("125.0000"));
    }

    #[test]
    fn tag_overlap_uses_set_semantics() {
        let a = vec!["usb-c".to_string(), "usb-c".to_string(), "charger".to_string()];
        let b = vec!["usb-c".to_string(), "cable".to_string()];
        assert_eq!(tag_overlap(&a, &b), 1);
    }

    #[test]
    fn tag_overlap_is_exact_and_case_sensitive() {
        let a = vec!["Charger".to_string()];
        let b = vec!["charger".to_string()];
        assert_eq!(tag_overlap(&a, &b), 0);
    }
}
