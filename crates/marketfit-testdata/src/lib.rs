//! Synthetic marketplace snapshots for marketfit.
//!
//! Two ways to get a `Dataset` without the real export:
//!
//! - [`DatasetGenerator`] produces a deterministic, realistically shaped
//!   snapshot from a seed (tech categories priced higher, late deliveries
//!   reviewed worse, some categories untranslated).
//! - [`Fixture`] builds tiny snapshots row by row for exact assertions.
//!
//! # Quick Start
//!
//! ```rust
//! use marketfit_testdata::{presets, DatasetGenerator};
//!
//! let dataset = DatasetGenerator::new(presets::unit_test()).generate();
//! println!("{}", dataset.summary());
//! ```
//!
//! # CSV Output
//!
//! ```rust,no_run
//! use marketfit_testdata::{presets, CsvOutput, DatasetGenerator};
//!
//! let dataset = DatasetGenerator::new(presets::unit_test()).generate();
//! CsvOutput::new().write_dataset("data".as_ref(), &dataset).unwrap();
//! ```

pub mod builder;
pub mod config;
pub mod fixture;
pub mod generator;
pub mod output;
pub mod presets;
pub mod rng;

pub use builder::DatasetBuilder;
pub use config::{CategorySpec, DatasetConfig, DeliveryModel, PriceModel};
pub use fixture::Fixture;
pub use generator::DatasetGenerator;
pub use output::{ArrowOutput, CsvOutput};
pub use rng::SeededRngFactory;
