//! Hand-built snapshots for exact assertions.

use chrono::{NaiveDate, NaiveDateTime};
use marketfit_source::{
    CategoryTranslation, Dataset, Order, OrderItem, OrderStatus, Payment, Product, Review,
};

/// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
///
/// Panics on malformed input; fixtures are written by hand in tests.
fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .unwrap_or_else(|_| panic!("fixture date '{}' is not YYYY-MM-DD[ HH:MM:SS]", value))
}

/// Fluent builder for small, fully specified datasets.
///
/// # Example
/// ```
/// use marketfit_testdata::Fixture;
///
/// let dataset = Fixture::new()
///     .order("o1", "2018-03-01", Some(("2018-03-10", "2018-03-15")))
///     .item("o1", "p1", "s1", 150.0)
///     .product("p1", Some("eletronicos"))
///     .translation("eletronicos", "electronics")
///     .payment("o1", 30.0)
///     .payment("o1", 45.5)
///     .review("o1", Some(5))
///     .build();
///
/// assert_eq!(dataset.payments.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Fixture {
    dataset: Dataset,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order. With `delivery = Some((estimated, delivered))` the order is
    /// `delivered`; otherwise it is `shipped` with no dates.
    pub fn order(self, order_id: &str, purchased: &str, delivery: Option<(&str, &str)>) -> Self {
        match delivery {
            Some((estimated, delivered)) => self.order_with_status(
                order_id,
                OrderStatus::Delivered,
                purchased,
                Some(estimated),
                Some(delivered),
            ),
            None => self.order_with_status(order_id, OrderStatus::Shipped, purchased, None, None),
        }
    }

    pub fn order_with_status(
        mut self,
        order_id: &str,
        status: OrderStatus,
        purchased: &str,
        estimated: Option<&str>,
        delivered: Option<&str>,
    ) -> Self {
        self.dataset.orders.push(Order {
            order_id: order_id.to_string(),
            customer_id: format!("c_{}", order_id),
            status,
            purchase_timestamp: at(purchased),
            estimated_delivery_date: estimated.map(at),
            delivered_customer_date: delivered.map(at),
        });
        self
    }

    /// Add an item; `order_item_id` is its position within the order.
    pub fn item(mut self, order_id: &str, product_id: &str, seller_id: &str, price: f64) -> Self {
        let position = self
            .dataset
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .count() as u32
            + 1;
        self.dataset.order_items.push(OrderItem {
            order_id: order_id.to_string(),
            order_item_id: position,
            product_id: product_id.to_string(),
            seller_id: seller_id.to_string(),
            price,
            freight_value: 0.0,
        });
        self
    }

    pub fn product(mut self, product_id: &str, category: Option<&str>) -> Self {
        self.dataset.products.push(Product {
            product_id: product_id.to_string(),
            category_name: category.map(str::to_string),
        });
        self
    }

    pub fn translation(mut self, category: &str, english: &str) -> Self {
        self.dataset.category_translations.push(CategoryTranslation {
            category_name: category.to_string(),
            category_name_english: english.to_string(),
        });
        self
    }

    /// Add a payment fragment; sequence numbers count up per order.
    pub fn payment(mut self, order_id: &str, value: f64) -> Self {
        let sequential = self
            .dataset
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .count() as u32
            + 1;
        self.dataset.payments.push(Payment {
            order_id: order_id.to_string(),
            payment_sequential: sequential,
            payment_type: "credit_card".to_string(),
            payment_installments: 1,
            payment_value: value,
        });
        self
    }

    pub fn review(mut self, order_id: &str, score: Option<u8>) -> Self {
        let review_id = format!("r{}", self.dataset.reviews.len() + 1);
        self.dataset.reviews.push(Review {
            review_id,
            order_id: order_id.to_string(),
            score,
        });
        self
    }

    pub fn build(self) -> Dataset {
        self.dataset
    }
}
