//! Names of the source relations and the kinds of store they come from.

use std::fmt;

/// One of the six relations a marketplace snapshot is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    Orders,
    OrderItems,
    Products,
    CategoryTranslation,
    Payments,
    Reviews,
}

impl Relation {
    /// Every relation, in load order.
    pub const ALL: [Relation; 6] = [
        Relation::Orders,
        Relation::OrderItems,
        Relation::Products,
        Relation::CategoryTranslation,
        Relation::Payments,
        Relation::Reviews,
    ];

    /// Table name used by the source dataset.
    pub fn table_name(&self) -> &'static str {
        match self {
            Relation::Orders => "orders",
            Relation::OrderItems => "order_items",
            Relation::Products => "products",
            Relation::CategoryTranslation => "product_category_name_translation",
            Relation::Payments => "order_payments",
            Relation::Reviews => "order_reviews",
        }
    }

    /// File name of the relation in the public CSV export of the dataset.
    pub fn default_csv_file(&self) -> &'static str {
        match self {
            Relation::Orders => "olist_orders_dataset.csv",
            Relation::OrderItems => "olist_order_items_dataset.csv",
            Relation::Products => "olist_products_dataset.csv",
            Relation::CategoryTranslation => "product_category_name_translation.csv",
            Relation::Payments => "olist_order_payments_dataset.csv",
            Relation::Reviews => "olist_order_reviews_dataset.csv",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl std::str::FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|r| r.table_name() == s)
            .ok_or_else(|| format!("Unknown relation: {}", s))
    }
}

/// Kind of store a `DataSource` reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Tables inside a DuckDB database file
    DuckDb,
    /// A directory of CSV files
    Csv,
    /// Relations already held in memory
    Memory,
}

impl SourceKind {
    /// Get a human-readable name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::DuckDb => "DuckDB",
            SourceKind::Csv => "CSV",
            SourceKind::Memory => "in-memory",
        }
    }
}
