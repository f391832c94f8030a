//! Configuration structures for synthetic snapshots.

use chrono::NaiveDate;
use rand_distr::LogNormal;

/// Top-level configuration for dataset generation.
#[derive(Clone)]
pub struct DatasetConfig {
    /// Master seed for reproducibility
    pub seed: u64,

    /// Purchase dates are drawn uniformly from this range (inclusive)
    pub purchase_range: (NaiveDate, NaiveDate),

    /// Number of orders to generate
    pub orders: usize,

    /// Items per order, inclusive range
    pub items_per_order: (u32, u32),

    /// Number of distinct sellers
    pub sellers: usize,

    /// Products generated per category
    pub products_per_category: usize,

    /// Category catalog with relative weights
    pub categories: Vec<CategorySpec>,

    /// Delivery timing model
    pub delivery: DeliveryModel,

    /// Probability that an order has a review
    pub review_rate: f64,

    /// Probability that a review carries no score
    pub unscored_review_rate: f64,

    /// Probability that an order's payment is split into two fragments
    pub split_payment_rate: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            purchase_range: (
                NaiveDate::from_ymd_opt(2017, 1, 1).expect("Invalid date"),
                NaiveDate::from_ymd_opt(2018, 8, 31).expect("Invalid date"),
            ),
            orders: 1000,
            items_per_order: (1, 3),
            sellers: 60,
            products_per_category: 25,
            categories: CategorySpec::marketplace(),
            delivery: DeliveryModel::default(),
            review_rate: 0.95,
            unscored_review_rate: 0.02,
            split_payment_rate: 0.08,
        }
    }
}

/// One product category of the catalog.
#[derive(Clone)]
pub struct CategorySpec {
    /// Label in the dataset's source language
    pub source_name: String,
    /// English label; `None` leaves the category untranslated
    pub english_name: Option<String>,
    /// Relative frequency among order items
    pub weight: f64,
    /// Item price distribution
    pub price: PriceModel,
}

impl CategorySpec {
    pub fn new(
        source_name: &str,
        english_name: Option<&str>,
        weight: f64,
        price: PriceModel,
    ) -> Self {
        Self {
            source_name: source_name.to_string(),
            english_name: english_name.map(str::to_string),
            weight,
            price,
        }
    }

    /// A catalog shaped like a general-goods marketplace: a handful of tech
    /// categories with higher prices, many cheaper household categories, and
    /// one category without an English translation.
    #[rustfmt::skip]
    pub fn marketplace() -> Vec<Self> {
        vec![
            Self::new("informatica_acessorios", Some("computers_accessories"), 0.07, PriceModel::new(90.0, 0.8)),
            Self::new("pcs", Some("computers"), 0.01, PriceModel::new(1100.0, 0.5)),
            Self::new("eletronicos", Some("electronics"), 0.03, PriceModel::new(60.0, 0.9)),
            Self::new("audio", Some("audio"), 0.01, PriceModel::new(120.0, 0.7)),
            Self::new("telefonia", Some("telephony"), 0.04, PriceModel::new(50.0, 0.9)),
            Self::new("cama_mesa_banho", Some("bed_bath_table"), 0.10, PriceModel::new(70.0, 0.6)),
            Self::new("beleza_saude", Some("health_beauty"), 0.09, PriceModel::new(90.0, 0.7)),
            Self::new("esporte_lazer", Some("sports_leisure"), 0.08, PriceModel::new(80.0, 0.7)),
            Self::new("moveis_decoracao", Some("furniture_decor"), 0.07, PriceModel::new(75.0, 0.7)),
            Self::new("utilidades_domesticas", Some("housewares"), 0.06, PriceModel::new(60.0, 0.7)),
            Self::new("relogios_presentes", Some("watches_gifts"), 0.05, PriceModel::new(150.0, 0.6)),
            Self::new("brinquedos", Some("toys"), 0.04, PriceModel::new(70.0, 0.7)),
            Self::new("pc_gamer", None, 0.005, PriceModel::new(900.0, 0.4)),
        ]
    }
}

/// Log-normal price distribution described by its median.
#[derive(Clone)]
pub struct PriceModel {
    pub median: f64,
    pub sigma: f64,
    distribution: LogNormal<f64>,
}

impl PriceModel {
    /// Panics if `median` is not positive or `sigma` is negative.
    pub fn new(median: f64, sigma: f64) -> Self {
        assert!(median > 0.0, "price median must be positive");
        Self {
            median,
            sigma,
            distribution: LogNormal::new(median.ln(), sigma).expect("Invalid price distribution"),
        }
    }

    pub fn distribution(&self) -> &LogNormal<f64> {
        &self.distribution
    }
}

/// Delivery timing: promised lead time and how far actual delivery deviates.
#[derive(Clone)]
pub struct DeliveryModel {
    /// Days between purchase and estimated delivery, inclusive range
    pub estimated_lead_days: (i64, i64),
    /// Days between estimated and actual delivery, inclusive range (negative = early)
    pub delay_days: (i64, i64),
    /// Probability an order reaches `delivered`
    pub delivered_rate: f64,
    /// Probability a non-delivered order is canceled rather than still shipping
    pub canceled_rate: f64,
}

impl Default for DeliveryModel {
    fn default() -> Self {
        Self {
            estimated_lead_days: (15, 30),
            delay_days: (-20, 10),
            delivered_rate: 0.96,
            canceled_rate: 0.3,
        }
    }
}

impl DeliveryModel {
    /// A carrier that always arrives within a day either side of the promise.
    pub fn punctual() -> Self {
        Self {
            estimated_lead_days: (2, 5),
            delay_days: (-1, 1),
            delivered_rate: 1.0,
            canceled_rate: 0.0,
        }
    }
}
