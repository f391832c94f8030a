//! Segment-aggregation pipeline for marketplace snapshots.
//!
//! Given a loaded [`Dataset`](marketfit_source::Dataset), the pipeline:
//!
//! 1. tags every order item as in or out of the tech segment ([`segment`]),
//! 2. joins items with their category translation, order, payments and
//!    reviews ([`join`]),
//! 3. computes grouped statistics ([`aggregate`]) and flattens them into
//!    tables ([`report`]).
//!
//! The business questions themselves live in [`reports`].
//!
//! # Example
//!
//! ```rust
//! use marketfit_pipeline::{Pipeline, PipelineConfig, ReportKind};
//! use marketfit_testdata::{presets, DatasetGenerator};
//!
//! let dataset = DatasetGenerator::new(presets::unit_test()).generate();
//! let pipeline = Pipeline::new(&dataset, PipelineConfig::default());
//!
//! let overview = pipeline.run(ReportKind::SegmentOverview);
//! assert_eq!(overview.num_rows(), 3);
//! ```

pub mod aggregate;
pub mod config;
mod error;
pub mod join;
pub mod report;
pub mod reports;
pub mod segment;

pub use aggregate::{aggregate, Aggregation, Aggregator, BucketSet, MetricSpec, Summary};
pub use config::{Benchmark, PipelineConfig};
pub use error::{AggregateError, PipelineError};
pub use report::{GroupKey, ReportEmitter, ReportTable, Value, YearMonth};
pub use reports::{run_report, Pipeline, ReportKind};
pub use segment::{is_refined_tech, PriceBucket, Segment, SegmentFilter};
