//! Source relations and the loader trait for marketfit datasets.
//!
//! This crate defines the entities of a marketplace snapshot and the abstract
//! interface every loader implements, so the pipeline never depends on where
//! the data lives (DuckDB file, CSV directory, in-memory fixture).

mod dataset;
mod error;
pub mod parse;
mod relation;
mod types;

pub use dataset::Dataset;
pub use error::SourceError;
pub use relation::{Relation, SourceKind};
pub use types::{CategoryTranslation, Order, OrderItem, OrderStatus, Payment, Product, Review};

use async_trait::async_trait;

/// Abstract interface for marketplace data loaders.
///
/// Loaders are responsible for:
/// - Reporting whether each relation is present
/// - Reading each relation into entities without transforming it
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Check if a relation can be read from this source.
    async fn relation_exists(&self, relation: Relation) -> Result<bool, SourceError>;

    async fn load_orders(&self) -> Result<Vec<Order>, SourceError>;

    async fn load_order_items(&self) -> Result<Vec<OrderItem>, SourceError>;

    async fn load_products(&self) -> Result<Vec<Product>, SourceError>;

    async fn load_category_translations(&self) -> Result<Vec<CategoryTranslation>, SourceError>;

    async fn load_payments(&self) -> Result<Vec<Payment>, SourceError>;

    async fn load_reviews(&self) -> Result<Vec<Review>, SourceError>;

    /// Get the kind of store this source reads from.
    fn kind(&self) -> SourceKind;

    /// Load every relation into a `Dataset`.
    ///
    /// Fails with `DataUnavailable` on the first relation that is missing,
    /// before any relation is read.
    async fn load_dataset(&self) -> Result<Dataset, SourceError> {
        let start = std::time::Instant::now();

        for relation in Relation::ALL {
            if !self.relation_exists(relation).await? {
                return Err(SourceError::data_unavailable(
                    relation,
                    format!("relation not found in {} source", self.kind().name()),
                ));
            }
        }

        let dataset = Dataset {
            orders: self.load_orders().await?,
            order_items: self.load_order_items().await?,
            products: self.load_products().await?,
            category_translations: self.load_category_translations().await?,
            payments: self.load_payments().await?,
            reviews: self.load_reviews().await?,
        };

        tracing::info!(
            source = self.kind().name(),
            rows = dataset.total_rows(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded dataset"
        );

        Ok(dataset)
    }
}

/// A source over relations already held in memory.
///
/// Relations set to `None` behave as missing tables.
#[derive(Debug, Clone)]
pub struct MemorySource {
    orders: Option<Vec<Order>>,
    order_items: Option<Vec<OrderItem>>,
    products: Option<Vec<Product>>,
    category_translations: Option<Vec<CategoryTranslation>>,
    payments: Option<Vec<Payment>>,
    reviews: Option<Vec<Review>>,
}

impl MemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            orders: Some(dataset.orders),
            order_items: Some(dataset.order_items),
            products: Some(dataset.products),
            category_translations: Some(dataset.category_translations),
            payments: Some(dataset.payments),
            reviews: Some(dataset.reviews),
        }
    }

    /// Drop a relation so that loading it fails.
    pub fn without(mut self, relation: Relation) -> Self {
        match relation {
            Relation::Orders => self.orders = None,
            Relation::OrderItems => self.order_items = None,
            Relation::Products => self.products = None,
            Relation::CategoryTranslation => self.category_translations = None,
            Relation::Payments => self.payments = None,
            Relation::Reviews => self.reviews = None,
        }
        self
    }

    fn take<T: Clone>(rows: &Option<Vec<T>>, relation: Relation) -> Result<Vec<T>, SourceError> {
        rows.clone()
            .ok_or_else(|| SourceError::data_unavailable(relation, "relation not held in memory"))
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn relation_exists(&self, relation: Relation) -> Result<bool, SourceError> {
        Ok(match relation {
            Relation::Orders => self.orders.is_some(),
            Relation::OrderItems => self.order_items.is_some(),
            Relation::Products => self.products.is_some(),
            Relation::CategoryTranslation => self.category_translations.is_some(),
            Relation::Payments => self.payments.is_some(),
            Relation::Reviews => self.reviews.is_some(),
        })
    }

    async fn load_orders(&self) -> Result<Vec<Order>, SourceError> {
        Self::take(&self.orders, Relation::Orders)
    }

    async fn load_order_items(&self) -> Result<Vec<OrderItem>, SourceError> {
        Self::take(&self.order_items, Relation::OrderItems)
    }

    async fn load_products(&self) -> Result<Vec<Product>, SourceError> {
        Self::take(&self.products, Relation::Products)
    }

    async fn load_category_translations(&self) -> Result<Vec<CategoryTranslation>, SourceError> {
        Self::take(&self.category_translations, Relation::CategoryTranslation)
    }

    async fn load_payments(&self) -> Result<Vec<Payment>, SourceError> {
        Self::take(&self.payments, Relation::Payments)
    }

    async fn load_reviews(&self) -> Result<Vec<Review>, SourceError> {
        Self::take(&self.reviews, Relation::Reviews)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Memory
    }
}
