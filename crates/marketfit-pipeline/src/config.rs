//! Pipeline settings, embedded under `pipeline:` in `marketfit.yml`.

use crate::segment::SegmentFilter;
use serde::{Deserialize, Serialize};

/// Default size of the seller leaderboard.
pub const DEFAULT_TOP_SELLERS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Definition of the tech segment
    pub segment: SegmentFilter,

    /// Rows kept in the `top_sellers` leaderboard
    pub top_sellers: usize,

    /// Competitor figures for `benchmark_comparison`
    pub benchmark: Option<Benchmark>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment: SegmentFilter::refined_tech(),
            top_sellers: DEFAULT_TOP_SELLERS,
            benchmark: None,
        }
    }
}

/// Published delivery and satisfaction figures of the competitor.
///
/// Any figure left out is reported as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Benchmark {
    pub name: String,
    pub avg_delivery_days: Option<f64>,
    pub pct_on_time: Option<f64>,
    pub avg_score: Option<f64>,
    pub pct_five_star: Option<f64>,
}
