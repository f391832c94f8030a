//! Deterministic snapshot generator.

use crate::config::DatasetConfig;
use crate::rng::SeededRngFactory;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use marketfit_source::{
    CategoryTranslation, Dataset, Order, OrderItem, OrderStatus, Payment, Product, Review,
};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const SCORE_WEIGHTS_ON_TIME: [f64; 5] = [0.08, 0.03, 0.08, 0.20, 0.61];
const SCORE_WEIGHTS_LATE: [f64; 5] = [0.35, 0.10, 0.15, 0.15, 0.25];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generates a full marketplace snapshot from a `DatasetConfig`.
pub struct DatasetGenerator {
    config: DatasetConfig,
    rng_factory: SeededRngFactory,
}

impl DatasetGenerator {
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            rng_factory: SeededRngFactory::new(config.seed),
            config,
        }
    }

    /// Generate every relation.
    pub fn generate(&self) -> Dataset {
        let products = self.generate_products();
        let category_translations = self.generate_translations();
        let orders = self.generate_orders();
        let order_items = self.generate_items(&orders, &products);
        let payments = self.generate_payments(&order_items);
        let reviews = self.generate_reviews(&orders);

        Dataset {
            orders,
            order_items,
            products,
            category_translations,
            payments,
            reviews,
        }
    }

    /// Products are laid out category by category, `products_per_category` each.
    pub fn generate_products(&self) -> Vec<Product> {
        self.config
            .categories
            .iter()
            .enumerate()
            .flat_map(|(c, category)| {
                (0..self.config.products_per_category).map(move |n| Product {
                    product_id: format!("p_{:02}_{:04}", c, n),
                    category_name: Some(category.source_name.clone()),
                })
            })
            .collect()
    }

    pub fn generate_translations(&self) -> Vec<CategoryTranslation> {
        self.config
            .categories
            .iter()
            .filter_map(|c| {
                c.english_name.as_ref().map(|english| CategoryTranslation {
                    category_name: c.source_name.clone(),
                    category_name_english: english.clone(),
                })
            })
            .collect()
    }

    pub fn generate_orders(&self) -> Vec<Order> {
        let mut rng = self.rng_factory.stream("orders");
        let delivery = &self.config.delivery;

        (0..self.config.orders)
            .map(|i| {
                let purchase = self.random_purchase_time(&mut rng);
                let lead = rng.gen_range(delivery.estimated_lead_days.0..=delivery.estimated_lead_days.1);
                let estimated = midnight(purchase.date()) + Duration::days(lead.max(0));

                let (status, delivered) = if rng.gen_bool(delivery.delivered_rate.clamp(0.0, 1.0)) {
                    let delay = rng.gen_range(delivery.delay_days.0..=delivery.delay_days.1);
                    let hour = rng.gen_range(8..20);
                    let at = estimated + Duration::days(delay) + Duration::hours(hour);
                    (OrderStatus::Delivered, Some(at.max(purchase + Duration::days(1))))
                } else if rng.gen_bool(delivery.canceled_rate.clamp(0.0, 1.0)) {
                    (OrderStatus::Canceled, None)
                } else {
                    (OrderStatus::Shipped, None)
                };

                Order {
                    order_id: format!("o_{:06}", i),
                    customer_id: format!("c_{:06}", i),
                    status,
                    purchase_timestamp: purchase,
                    estimated_delivery_date: Some(estimated),
                    delivered_customer_date: delivered,
                }
            })
            .collect()
    }

    pub fn generate_items(&self, orders: &[Order], products: &[Product]) -> Vec<OrderItem> {
        let mut rng = self.rng_factory.stream("items");
        let per_category = self.config.products_per_category;
        let categories = &self.config.categories;
        if categories.is_empty() || products.is_empty() {
            return Vec::new();
        }

        let category_choice = WeightedIndex::new(categories.iter().map(|c| c.weight))
            .expect("category weights must be non-negative with a positive sum");
        let (min_items, max_items) = self.config.items_per_order;

        let mut items = Vec::new();
        for order in orders {
            let count = rng.gen_range(min_items..=max_items);
            for position in 1..=count {
                let category = category_choice.sample(&mut rng);
                let product = &products[category * per_category + rng.gen_range(0..per_category)];
                let price = round2(categories[category].price.distribution().sample(&mut rng).max(1.0));

                items.push(OrderItem {
                    order_id: order.order_id.clone(),
                    order_item_id: position,
                    product_id: product.product_id.clone(),
                    seller_id: format!("s_{:04}", rng.gen_range(0..self.config.sellers)),
                    price,
                    freight_value: round2(rng.gen_range(5.0..40.0)),
                });
            }
        }

        items
    }

    /// One payment per order, occasionally split into a voucher plus a card fragment.
    pub fn generate_payments(&self, items: &[OrderItem]) -> Vec<Payment> {
        let mut rng = self.rng_factory.stream("payments");
        let mut payments = Vec::new();

        for order_items in items.chunk_by(|a, b| a.order_id == b.order_id) {
            let order_id = &order_items[0].order_id;
            let total = round2(order_items.iter().map(|i| i.price + i.freight_value).sum());

            if rng.gen_bool(self.config.split_payment_rate) {
                let voucher = round2(total * rng.gen_range(0.1..0.6));
                payments.push(Payment {
                    order_id: order_id.clone(),
                    payment_sequential: 1,
                    payment_type: "voucher".to_string(),
                    payment_installments: 1,
                    payment_value: voucher,
                });
                payments.push(Payment {
                    order_id: order_id.clone(),
                    payment_sequential: 2,
                    payment_type: "credit_card".to_string(),
                    payment_installments: rng.gen_range(1..=10),
                    payment_value: round2(total - voucher),
                });
            } else {
                payments.push(Payment {
                    order_id: order_id.clone(),
                    payment_sequential: 1,
                    payment_type: "credit_card".to_string(),
                    payment_installments: rng.gen_range(1..=10),
                    payment_value: total,
                });
            }
        }

        payments
    }

    /// Late deliveries draw from a harsher score distribution.
    pub fn generate_reviews(&self, orders: &[Order]) -> Vec<Review> {
        let mut rng = self.rng_factory.stream("reviews");
        let on_time = WeightedIndex::new(SCORE_WEIGHTS_ON_TIME).expect("valid score weights");
        let late = WeightedIndex::new(SCORE_WEIGHTS_LATE).expect("valid score weights");

        let mut reviews = Vec::new();
        for (i, order) in orders.iter().enumerate() {
            if !rng.gen_bool(self.config.review_rate) {
                continue;
            }

            let was_late = match (order.delivered_customer_date, order.estimated_delivery_date) {
                (Some(delivered), Some(estimated)) => delivered.date() > estimated.date(),
                _ => order.status != OrderStatus::Delivered,
            };
            let weights = if was_late { &late } else { &on_time };
            let score = (weights.sample(&mut rng) + 1) as u8;

            reviews.push(Review {
                review_id: format!("r_{:06}", i),
                order_id: order.order_id.clone(),
                score: (!rng.gen_bool(self.config.unscored_review_rate)).then_some(score),
            });
        }

        reviews
    }

    fn random_purchase_time(&self, rng: &mut ChaCha8Rng) -> NaiveDateTime {
        let (start, end) = self.config.purchase_range;
        let days = (end - start).num_days().max(0);
        let day = start + Duration::days(rng.gen_range(0..=days));
        midnight(day) + Duration::seconds(rng.gen_range(0..86_400))
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DatasetBuilder;
    use std::collections::HashMap;

    fn small() -> Dataset {
        let config = DatasetBuilder::new().seed(11).orders(200).build();
        DatasetGenerator::new(config).generate()
    }

    #[test]
    fn test_generate_counts() {
        let data = small();
        assert_eq!(data.orders.len(), 200);
        assert!(data.order_items.len() >= 200);
        assert!(data.order_items.len() <= 600);
        assert_eq!(data.products.len(), 13 * 25);
        // pc_gamer is deliberately untranslated
        assert_eq!(data.category_translations.len(), 12);
    }

    #[test]
    fn test_determinism() {
        let a = small();
        let b = small();
        assert_eq!(a.orders, b.orders);
        assert_eq!(a.order_items, b.order_items);
        assert_eq!(a.payments, b.payments);
        assert_eq!(a.reviews, b.reviews);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = DatasetGenerator::new(DatasetBuilder::new().seed(1).orders(50).build()).generate();
        let b = DatasetGenerator::new(DatasetBuilder::new().seed(2).orders(50).build()).generate();
        assert_ne!(a.order_items, b.order_items);
    }

    #[test]
    fn test_payments_cover_item_totals() {
        let data = small();
        let mut paid: HashMap<&str, f64> = HashMap::new();
        for p in &data.payments {
            *paid.entry(p.order_id.as_str()).or_default() += p.payment_value;
        }
        let mut owed: HashMap<&str, f64> = HashMap::new();
        for i in &data.order_items {
            *owed.entry(i.order_id.as_str()).or_default() += i.price + i.freight_value;
        }

        assert_eq!(paid.len(), owed.len());
        for (order, total) in owed {
            assert!((paid[order] - total).abs() < 0.02, "order {order}");
        }
    }

    #[test]
    fn test_delivered_orders_have_dates() {
        let data = small();
        for order in &data.orders {
            match order.status {
                OrderStatus::Delivered => {
                    assert!(order.has_delivery_dates());
                    assert!(order.delivered_customer_date.unwrap() > order.purchase_timestamp);
                }
                _ => assert!(order.delivered_customer_date.is_none()),
            }
        }
    }

    #[test]
    fn test_review_scores_in_range() {
        let data = small();
        assert!(!data.reviews.is_empty());
        for review in &data.reviews {
            if let Some(score) = review.score {
                assert!((1..=5).contains(&score));
            }
        }
    }
}
