//! Entities of a marketplace snapshot.
//!
//! These are read-only: loaders build them once and nothing downstream mutates them.

use chrono::NaiveDateTime;
use std::fmt;

/// Lifecycle status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Created,
    Approved,
    Invoiced,
    Processing,
    Shipped,
    Delivered,
    Unavailable,
    Canceled,
    /// Any label the dataset uses that is not listed above
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Approved => "approved",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Unavailable => "unavailable",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Other(label) => label,
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "created" => OrderStatus::Created,
            "approved" => OrderStatus::Approved,
            "invoiced" => OrderStatus::Invoiced,
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "unavailable" => OrderStatus::Unavailable,
            "canceled" => OrderStatus::Canceled,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub purchase_timestamp: NaiveDateTime,
    pub estimated_delivery_date: Option<NaiveDateTime>,
    pub delivered_customer_date: Option<NaiveDateTime>,
}

impl Order {
    /// Delivered with both dates present: the only orders delivery metrics apply to.
    pub fn has_delivery_dates(&self) -> bool {
        self.status == OrderStatus::Delivered
            && self.estimated_delivery_date.is_some()
            && self.delivered_customer_date.is_some()
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub order_id: String,
    /// Position of the item within its order (1-based)
    pub order_item_id: u32,
    pub product_id: String,
    pub seller_id: String,
    pub price: f64,
    pub freight_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub product_id: String,
    /// Category label in the dataset's source language
    pub category_name: Option<String>,
}

/// Source-language category label to English label.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTranslation {
    pub category_name: String,
    pub category_name_english: String,
}

/// One payment fragment (installment or voucher) of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub order_id: String,
    pub payment_sequential: u32,
    pub payment_type: String,
    pub payment_installments: u32,
    pub payment_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub review_id: String,
    pub order_id: String,
    /// 1-5, absent when the review carries no score
    pub score: Option<u8>,
}
