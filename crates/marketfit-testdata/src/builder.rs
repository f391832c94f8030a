//! Fluent builder for DatasetConfig.

use crate::config::{CategorySpec, DatasetConfig, DeliveryModel};
use chrono::NaiveDate;

/// Fluent builder for DatasetConfig.
///
/// # Example
/// ```
/// use marketfit_testdata::DatasetBuilder;
///
/// let config = DatasetBuilder::new()
///     .seed(42)
///     .orders(500)
///     .items_per_order(1, 2)
///     .year(2018)
///     .build();
/// ```
pub struct DatasetBuilder {
    config: DatasetConfig,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            config: DatasetConfig::default(),
        }
    }

    /// Set the master seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn orders(mut self, count: usize) -> Self {
        self.config.orders = count;
        self
    }

    /// Set the inclusive range of items per order. `min` is raised to 1.
    pub fn items_per_order(mut self, min: u32, max: u32) -> Self {
        let min = min.max(1);
        self.config.items_per_order = (min, max.max(min));
        self
    }

    pub fn sellers(mut self, count: usize) -> Self {
        self.config.sellers = count.max(1);
        self
    }

    pub fn products_per_category(mut self, count: usize) -> Self {
        self.config.products_per_category = count.max(1);
        self
    }

    /// Set the purchase date range (inclusive).
    pub fn purchase_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.config.purchase_range = if start <= end { (start, end) } else { (end, start) };
        self
    }

    /// Limit purchases to one calendar year.
    pub fn year(self, year: i32) -> Self {
        match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => self.purchase_range(start, end),
            _ => self,
        }
    }

    /// Replace the category catalog.
    pub fn categories(mut self, categories: Vec<CategorySpec>) -> Self {
        self.config.categories = categories;
        self
    }

    pub fn delivery(mut self, model: DeliveryModel) -> Self {
        self.config.delivery = model;
        self
    }

    /// Every order delivered within a day of its estimate.
    pub fn punctual_delivery(self) -> Self {
        self.delivery(DeliveryModel::punctual())
    }

    pub fn review_rate(mut self, rate: f64) -> Self {
        self.config.review_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn split_payment_rate(mut self, rate: f64) -> Self {
        self.config.split_payment_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> DatasetConfig {
        self.config
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
