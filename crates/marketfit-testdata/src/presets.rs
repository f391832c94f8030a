//! Pre-configured snapshot scenarios.

use crate::builder::DatasetBuilder;
use crate::config::DatasetConfig;

/// Small snapshot for unit tests.
///
/// - 200 orders, one year of purchases
/// - ~400 items
pub fn unit_test() -> DatasetConfig {
    DatasetBuilder::new().seed(42).orders(200).year(2018).build()
}

/// Medium snapshot for integration tests.
///
/// - 5,000 orders over twenty months
/// - ~10,000 items
pub fn integration_test() -> DatasetConfig {
    DatasetBuilder::new().seed(42).orders(5_000).build()
}

/// Large snapshot close to the size of the public dataset.
///
/// - 100,000 orders
/// - ~110,000 items
pub fn full_scale() -> DatasetConfig {
    DatasetBuilder::new()
        .seed(42)
        .orders(100_000)
        .items_per_order(1, 2)
        .sellers(3_000)
        .products_per_category(2_000)
        .build()
}
