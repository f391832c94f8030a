//! In-memory snapshot of all six relations.

use crate::relation::Relation;
use crate::types::{CategoryTranslation, Order, OrderItem, Payment, Product, Review};

/// A fully loaded marketplace snapshot.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub products: Vec<Product>,
    pub category_translations: Vec<CategoryTranslation>,
    pub payments: Vec<Payment>,
    pub reviews: Vec<Review>,
}

impl Dataset {
    /// Number of rows held for a relation.
    pub fn row_count(&self, relation: Relation) -> usize {
        match relation {
            Relation::Orders => self.orders.len(),
            Relation::OrderItems => self.order_items.len(),
            Relation::Products => self.products.len(),
            Relation::CategoryTranslation => self.category_translations.len(),
            Relation::Payments => self.payments.len(),
            Relation::Reviews => self.reviews.len(),
        }
    }

    /// Total rows across every relation.
    pub fn total_rows(&self) -> usize {
        Relation::ALL.iter().map(|r| self.row_count(*r)).sum()
    }

    /// One-line description of the snapshot, e.g. for progress output.
    pub fn summary(&self) -> String {
        format!(
            "{} orders, {} items, {} products, {} translations, {} payments, {} reviews",
            self.orders.len(),
            self.order_items.len(),
            self.products.len(),
            self.category_translations.len(),
            self.payments.len(),
            self.reviews.len()
        )
    }
}
