//! The refined tech segment and the price buckets used across reports.
//!
//! Every report decides tech membership through [`SegmentFilter`]; nothing
//! else in the crate lists categories or price floors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// English category labels that make up the refined tech segment.
pub const TECH_CATEGORIES: [&str; 5] = [
    "computers",
    "computers_accessories",
    "electronics",
    "audio",
    "telephony",
];

/// Minimum item price for the refined tech segment.
pub const TECH_PRICE_FLOOR: f64 = 100.0;

/// True iff `category` is one of [`TECH_CATEGORIES`] and `price >= 100`.
///
/// A missing (untranslated) category is never tech.
pub fn is_refined_tech(category: Option<&str>, price: f64) -> bool {
    category.is_some_and(|c| TECH_CATEGORIES.contains(&c)) && price >= TECH_PRICE_FLOOR
}

/// Predicate over (English category, price) defining the premium segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentFilter {
    pub categories: BTreeSet<String>,
    pub price_floor: f64,
}

impl SegmentFilter {
    /// The refined tech segment: [`TECH_CATEGORIES`] priced at 100 or more.
    pub fn refined_tech() -> Self {
        Self {
            categories: TECH_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            price_floor: TECH_PRICE_FLOOR,
        }
    }

    pub fn matches(&self, category: Option<&str>, price: f64) -> bool {
        category.is_some_and(|c| self.categories.contains(c)) && price >= self.price_floor
    }

    /// Category membership alone, ignoring the price floor.
    pub fn covers_category(&self, category: Option<&str>) -> bool {
        category.is_some_and(|c| self.categories.contains(c))
    }
}

impl Default for SegmentFilter {
    fn default() -> Self {
        Self::refined_tech()
    }
}

/// Named partition of order items (or of orders, via their items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// No filter
    AllItems,
    /// Matches the segment filter
    TechSegment,
    /// Complement of `TechSegment`
    Other,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::AllItems, Segment::TechSegment, Segment::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Segment::AllItems => "ALL_ITEMS",
            Segment::TechSegment => "TECH_SEGMENT",
            Segment::Other => "OTHER",
        }
    }

    /// `AllItems` plus whichever of `TechSegment` / `Other` applies.
    pub fn memberships(is_tech: bool) -> [Segment; 2] {
        if is_tech {
            [Segment::AllItems, Segment::TechSegment]
        } else {
            [Segment::AllItems, Segment::Other]
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Item price bands: `< 50`, `50 <= p < 100`, `>= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceBucket {
    Under50,
    From50To100,
    From100,
}

impl PriceBucket {
    pub const ALL: [PriceBucket; 3] = [
        PriceBucket::Under50,
        PriceBucket::From50To100,
        PriceBucket::From100,
    ];

    /// Bucket of a price. NaN falls in no bucket.
    pub fn of(price: f64) -> Option<PriceBucket> {
        if price < 50.0 {
            Some(PriceBucket::Under50)
        } else if price < 100.0 {
            Some(PriceBucket::From50To100)
        } else if price >= 100.0 {
            Some(PriceBucket::From100)
        } else {
            None
        }
    }

    /// Whether `price` falls in this bucket; each bound is stated on its own
    /// so the bucket set check can catch a boundary that drifts.
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceBucket::Under50 => price < 50.0,
            PriceBucket::From50To100 => (50.0..100.0).contains(&price),
            PriceBucket::From100 => price >= 100.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceBucket::Under50 => "under_50",
            PriceBucket::From50To100 => "50_to_100",
            PriceBucket::From100 => "100_plus",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_refined_tech_examples() {
        assert!(is_refined_tech(Some("electronics"), 150.0));
        assert!(is_refined_tech(Some("telephony"), 100.0));
        assert!(!is_refined_tech(Some("electronics"), 80.0));
        assert!(!is_refined_tech(Some("electronics"), 99.99));
        assert!(!is_refined_tech(Some("toys"), 500.0));
        assert!(!is_refined_tech(None, 500.0));
        // Labels are matched exactly, not case-folded
        assert!(!is_refined_tech(Some("Electronics"), 500.0));
    }

    #[test]
    fn test_filter_agrees_with_constants() {
        let filter = SegmentFilter::refined_tech();
        assert_eq!(filter.categories.len(), 5);
        assert_eq!(filter, SegmentFilter::default());
        for category in TECH_CATEGORIES {
            assert!(filter.matches(Some(category), 100.0));
            assert!(!filter.matches(Some(category), 99.0));
            assert!(filter.covers_category(Some(category)));
        }
    }

    #[test]
    fn test_memberships() {
        assert_eq!(
            Segment::memberships(true),
            [Segment::AllItems, Segment::TechSegment]
        );
        assert_eq!(Segment::memberships(false), [Segment::AllItems, Segment::Other]);
        assert_eq!(Segment::TechSegment.to_string(), "TECH_SEGMENT");
    }

    #[test]
    fn test_price_bucket_boundaries() {
        assert_eq!(PriceBucket::of(49.99), Some(PriceBucket::Under50));
        assert_eq!(PriceBucket::of(50.0), Some(PriceBucket::From50To100));
        assert_eq!(PriceBucket::of(99.99), Some(PriceBucket::From50To100));
        assert_eq!(PriceBucket::of(100.0), Some(PriceBucket::From100));
        assert_eq!(PriceBucket::of(f64::NAN), None);
    }

    fn category() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            proptest::sample::select(TECH_CATEGORIES.to_vec()).prop_map(|c| Some(c.to_string())),
            "[a-z_]{1,24}".prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn refined_tech_iff_member_and_floor(category in category(), price in -10.0f64..1000.0) {
            let expected = category
                .as_deref()
                .map(|c| TECH_CATEGORIES.contains(&c))
                .unwrap_or(false)
                && price >= 100.0;
            prop_assert_eq!(is_refined_tech(category.as_deref(), price), expected);
            prop_assert_eq!(SegmentFilter::refined_tech().matches(category.as_deref(), price), expected);
        }

        #[test]
        fn price_buckets_exclusive_and_exhaustive(price in -1000.0f64..100_000.0) {
            let hits: Vec<PriceBucket> = PriceBucket::ALL
                .into_iter()
                .filter(|b| b.contains(price))
                .collect();
            prop_assert_eq!(hits.len(), 1);
            prop_assert_eq!(Some(hits[0]), PriceBucket::of(price));
        }
    }
}
