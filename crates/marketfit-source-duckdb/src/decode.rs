//! Arrow RecordBatch to entity conversion.
//!
//! Every loader query casts its columns to VARCHAR, DOUBLE or BIGINT, and the
//! decoders here cast again on the Arrow side so that Utf8/LargeUtf8 or
//! Int32/Int64 differences between DuckDB versions don't matter.

use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use marketfit_source::parse::{parse_timestamp, require_timestamp, review_score};
use marketfit_source::{
    CategoryTranslation, Order, OrderItem, OrderStatus, Payment, Product, Relation, Review,
    SourceError,
};

fn column<T: Array + Clone + 'static>(
    relation: Relation,
    batch: &RecordBatch,
    name: &str,
    data_type: &DataType,
) -> Result<T, SourceError> {
    let raw = batch.column_by_name(name).ok_or_else(|| {
        SourceError::invalid_value(relation, name, "column missing from query result")
    })?;

    let converted = cast(raw.as_ref(), data_type)
        .map_err(|e| SourceError::invalid_value(relation, name, e.to_string()))?;

    converted
        .as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| {
            SourceError::invalid_value(relation, name, format!("expected {} column", data_type))
        })
}

fn strings(
    relation: Relation,
    batch: &RecordBatch,
    name: &str,
) -> Result<StringArray, SourceError> {
    column(relation, batch, name, &DataType::Utf8)
}

fn floats(
    relation: Relation,
    batch: &RecordBatch,
    name: &str,
) -> Result<Float64Array, SourceError> {
    column(relation, batch, name, &DataType::Float64)
}

fn ints(
    relation: Relation,
    batch: &RecordBatch,
    name: &str,
) -> Result<Int64Array, SourceError> {
    column(relation, batch, name, &DataType::Int64)
}

fn opt_str(array: &StringArray, row: usize) -> Option<&str> {
    (!array.is_null(row)).then(|| array.value(row))
}

fn req_str(
    relation: Relation,
    name: &str,
    array: &StringArray,
    row: usize,
) -> Result<String, SourceError> {
    opt_str(array, row)
        .map(str::to_string)
        .ok_or_else(|| SourceError::invalid_value(relation, name, format!("null at row {}", row)))
}

fn req_f64(
    relation: Relation,
    name: &str,
    array: &Float64Array,
    row: usize,
) -> Result<f64, SourceError> {
    if array.is_null(row) {
        return Err(SourceError::invalid_value(
            relation,
            name,
            format!("null at row {}", row),
        ));
    }
    Ok(array.value(row))
}

fn opt_i64(array: &Int64Array, row: usize) -> Option<i64> {
    (!array.is_null(row)).then(|| array.value(row))
}

fn to_u32(relation: Relation, name: &str, value: Option<i64>) -> Result<u32, SourceError> {
    let value = value.unwrap_or(0);
    u32::try_from(value)
        .map_err(|_| SourceError::invalid_value(relation, name, format!("{} out of range", value)))
}

pub fn orders(batches: &[RecordBatch]) -> Result<Vec<Order>, SourceError> {
    let relation = Relation::Orders;
    let mut out = Vec::new();

    for batch in batches {
        let ids = strings(relation, batch, "order_id")?;
        let customers = strings(relation, batch, "customer_id")?;
        let statuses = strings(relation, batch, "order_status")?;
        let purchased = strings(relation, batch, "order_purchase_timestamp")?;
        let estimated = strings(relation, batch, "order_estimated_delivery_date")?;
        let delivered = strings(relation, batch, "order_delivered_customer_date")?;

        for row in 0..batch.num_rows() {
            out.push(Order {
                order_id: req_str(relation, "order_id", &ids, row)?,
                customer_id: opt_str(&customers, row).unwrap_or_default().to_string(),
                status: OrderStatus::from(opt_str(&statuses, row).unwrap_or_default()),
                purchase_timestamp: require_timestamp(
                    relation,
                    "order_purchase_timestamp",
                    opt_str(&purchased, row),
                )?,
                estimated_delivery_date: parse_timestamp(
                    relation,
                    "order_estimated_delivery_date",
                    opt_str(&estimated, row),
                )?,
                delivered_customer_date: parse_timestamp(
                    relation,
                    "order_delivered_customer_date",
                    opt_str(&delivered, row),
                )?,
            });
        }
    }

    Ok(out)
}

pub fn order_items(batches: &[RecordBatch]) -> Result<Vec<OrderItem>, SourceError> {
    let relation = Relation::OrderItems;
    let mut out = Vec::new();

    for batch in batches {
        let order_ids = strings(relation, batch, "order_id")?;
        let item_ids = ints(relation, batch, "order_item_id")?;
        let product_ids = strings(relation, batch, "product_id")?;
        let seller_ids = strings(relation, batch, "seller_id")?;
        let prices = floats(relation, batch, "price")?;
        let freight = floats(relation, batch, "freight_value")?;

        for row in 0..batch.num_rows() {
            out.push(OrderItem {
                order_id: req_str(relation, "order_id", &order_ids, row)?,
                order_item_id: to_u32(relation, "order_item_id", opt_i64(&item_ids, row))?,
                product_id: req_str(relation, "product_id", &product_ids, row)?,
                seller_id: req_str(relation, "seller_id", &seller_ids, row)?,
                price: req_f64(relation, "price", &prices, row)?,
                freight_value: if freight.is_null(row) {
                    0.0
                } else {
                    freight.value(row)
                },
            });
        }
    }

    Ok(out)
}

pub fn products(batches: &[RecordBatch]) -> Result<Vec<Product>, SourceError> {
    let relation = Relation::Products;
    let mut out = Vec::new();

    for batch in batches {
        let ids = strings(relation, batch, "product_id")?;
        let categories = strings(relation, batch, "product_category_name")?;

        for row in 0..batch.num_rows() {
            out.push(Product {
                product_id: req_str(relation, "product_id", &ids, row)?,
                category_name: opt_str(&categories, row)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
            });
        }
    }

    Ok(out)
}

pub fn category_translations(
    batches: &[RecordBatch],
) -> Result<Vec<CategoryTranslation>, SourceError> {
    let relation = Relation::CategoryTranslation;
    let mut out = Vec::new();

    for batch in batches {
        let names = strings(relation, batch, "product_category_name")?;
        let english = strings(relation, batch, "product_category_name_english")?;

        for row in 0..batch.num_rows() {
            out.push(CategoryTranslation {
                category_name: req_str(relation, "product_category_name", &names, row)?,
                category_name_english: req_str(
                    relation,
                    "product_category_name_english",
                    &english,
                    row,
                )?,
            });
        }
    }

    Ok(out)
}

pub fn payments(batches: &[RecordBatch]) -> Result<Vec<Payment>, SourceError> {
    let relation = Relation::Payments;
    let mut out = Vec::new();

    for batch in batches {
        let order_ids = strings(relation, batch, "order_id")?;
        let sequentials = ints(relation, batch, "payment_sequential")?;
        let types = strings(relation, batch, "payment_type")?;
        let installments = ints(relation, batch, "payment_installments")?;
        let values = floats(relation, batch, "payment_value")?;

        for row in 0..batch.num_rows() {
            out.push(Payment {
                order_id: req_str(relation, "order_id", &order_ids, row)?,
                payment_sequential: to_u32(
                    relation,
                    "payment_sequential",
                    opt_i64(&sequentials, row),
                )?,
                payment_type: opt_str(&types, row).unwrap_or_default().to_string(),
                payment_installments: to_u32(
                    relation,
                    "payment_installments",
                    opt_i64(&installments, row),
                )?,
                payment_value: req_f64(relation, "payment_value", &values, row)?,
            });
        }
    }

    Ok(out)
}

pub fn reviews(batches: &[RecordBatch]) -> Result<Vec<Review>, SourceError> {
    let relation = Relation::Reviews;
    let mut out = Vec::new();

    for batch in batches {
        let review_ids = strings(relation, batch, "review_id")?;
        let order_ids = strings(relation, batch, "order_id")?;
        let scores = ints(relation, batch, "review_score")?;

        for row in 0..batch.num_rows() {
            out.push(Review {
                review_id: opt_str(&review_ids, row).unwrap_or_default().to_string(),
                order_id: req_str(relation, "order_id", &order_ids, row)?,
                score: review_score(opt_i64(&scores, row))?,
            });
        }
    }

    Ok(out)
}
