//! Joins over the snapshot.
//!
//! Reports never touch the raw relations: they aggregate over the fact rows
//! built here, where every item already knows its English category, its
//! order's purchase date and whether it is in the tech segment.

use crate::aggregate::{date_delta, Aggregator, MetricSpec};
use crate::segment::SegmentFilter;
use chrono::NaiveDateTime;
use marketfit_source::{Dataset, OrderStatus, Payment};
use std::collections::{BTreeMap, HashMap};

/// An order item joined with its product, category translation and order.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFacts {
    pub order_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub price: f64,
    /// English label; `None` when the product is unknown or its category is untranslated
    pub category: Option<String>,
    /// `None` when the item's order is missing from the snapshot
    pub purchased: Option<NaiveDateTime>,
    pub is_tech: bool,
}

/// An order with the facts derived from its items, payments and delivery dates.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFacts {
    pub order_id: String,
    pub status: OrderStatus,
    pub purchased: NaiveDateTime,
    /// At least one of the order's items is in the tech segment
    pub is_tech: bool,
    pub items: usize,
    /// Sum of payment fragments; `None` when the order has no payment rows
    pub paid: Option<f64>,
    /// Days from purchase to delivery, for delivered orders with both dates
    pub delivery_days: Option<i64>,
    /// Days from estimated to actual delivery; positive means late
    pub delay_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewFacts {
    pub order_id: String,
    pub score: Option<u8>,
    pub is_tech: bool,
}

/// Every join the report catalog needs, computed once per snapshot.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    pub items: Vec<ItemFacts>,
    pub orders: Vec<OrderFacts>,
    pub reviews: Vec<ReviewFacts>,
}

impl Facts {
    pub fn build(dataset: &Dataset, filter: &SegmentFilter) -> Self {
        let items = enrich_items(dataset, filter);
        let orders = order_facts(dataset, &items);
        let reviews = review_facts(dataset, &orders);

        tracing::debug!(
            items = items.len(),
            orders = orders.len(),
            reviews = reviews.len(),
            tech_items = items.iter().filter(|i| i.is_tech).count(),
            "joined snapshot"
        );

        Self {
            items,
            orders,
            reviews,
        }
    }
}

/// Total paid per order: fragments are summed, never averaged.
pub fn order_totals(payments: &[Payment]) -> BTreeMap<String, f64> {
    Aggregator::new(|p: &Payment| p.order_id.clone())
        .metric(MetricSpec::sum("paid", |p: &Payment| Some(p.payment_value)))
        .run(payments)
        .iter()
        .filter_map(|(order_id, group)| {
            let paid = group.number("paid")?;
            Some((order_id.clone(), paid))
        })
        .collect()
}

/// English category per product. Categories without a translation map to
/// `None`; the row is kept, not dropped.
pub fn product_categories(dataset: &Dataset) -> HashMap<&str, Option<&str>> {
    let translations: HashMap<&str, &str> = dataset
        .category_translations
        .iter()
        .map(|t| (t.category_name.as_str(), t.category_name_english.as_str()))
        .collect();

    let mut untranslated = 0usize;
    let categories = dataset
        .products
        .iter()
        .map(|p| {
            let english = p
                .category_name
                .as_deref()
                .and_then(|c| translations.get(c).copied());
            if p.category_name.is_some() && english.is_none() {
                untranslated += 1;
            }
            (p.product_id.as_str(), english)
        })
        .collect();

    if untranslated > 0 {
        tracing::debug!(
            products = untranslated,
            "categories without an English translation kept with a null label"
        );
    }

    categories
}

pub fn enrich_items(dataset: &Dataset, filter: &SegmentFilter) -> Vec<ItemFacts> {
    let categories = product_categories(dataset);
    let purchased: HashMap<&str, NaiveDateTime> = dataset
        .orders
        .iter()
        .map(|o| (o.order_id.as_str(), o.purchase_timestamp))
        .collect();

    dataset
        .order_items
        .iter()
        .map(|item| {
            let category = categories
                .get(item.product_id.as_str())
                .copied()
                .flatten();
            ItemFacts {
                order_id: item.order_id.clone(),
                product_id: item.product_id.clone(),
                seller_id: item.seller_id.clone(),
                price: item.price,
                category: category.map(str::to_string),
                purchased: purchased.get(item.order_id.as_str()).copied(),
                is_tech: filter.matches(category, item.price),
            }
        })
        .collect()
}

pub fn order_facts(dataset: &Dataset, items: &[ItemFacts]) -> Vec<OrderFacts> {
    let totals = order_totals(&dataset.payments);

    let mut per_order: HashMap<&str, (usize, bool)> = HashMap::new();
    for item in items {
        let entry = per_order.entry(item.order_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 |= item.is_tech;
    }

    dataset
        .orders
        .iter()
        .map(|order| {
            let (items, is_tech) = per_order
                .get(order.order_id.as_str())
                .copied()
                .unwrap_or_default();

            let (delivery_days, delay_days) = match (
                order.has_delivery_dates(),
                order.delivered_customer_date,
                order.estimated_delivery_date,
            ) {
                (true, Some(delivered), Some(estimated)) => (
                    Some(date_delta(delivered, order.purchase_timestamp)),
                    Some(date_delta(delivered, estimated)),
                ),
                _ => (None, None),
            };

            OrderFacts {
                order_id: order.order_id.clone(),
                status: order.status.clone(),
                purchased: order.purchase_timestamp,
                is_tech,
                items,
                paid: totals.get(&order.order_id).copied(),
                delivery_days,
                delay_days,
            }
        })
        .collect()
}

/// Reviews tagged with their order's segment. Reviews of unknown orders are
/// kept and count as non-tech.
pub fn review_facts(dataset: &Dataset, orders: &[OrderFacts]) -> Vec<ReviewFacts> {
    let tech: HashMap<&str, bool> = orders
        .iter()
        .map(|o| (o.order_id.as_str(), o.is_tech))
        .collect();

    dataset
        .reviews
        .iter()
        .map(|r| ReviewFacts {
            order_id: r.order_id.clone(),
            score: r.score,
            is_tech: tech.get(r.order_id.as_str()).copied().unwrap_or(false),
        })
        .collect()
}
