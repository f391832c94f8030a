//! Output formats for generated snapshots.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::csv::Writer;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use marketfit_source::{Dataset, Relation};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("Failed to create RecordBatch")
}

// ----------------------------------------------------------------------------
// Arrow Output
// ----------------------------------------------------------------------------

/// Arrow output format - one RecordBatch per relation, using the dataset's
/// column names. Timestamps are rendered as text so every consumer parses
/// them the same way.
pub struct ArrowOutput;

impl ArrowOutput {
    pub fn new() -> Self {
        Self
    }

    pub fn relation_to_batch(&self, dataset: &Dataset, relation: Relation) -> Result<RecordBatch> {
        match relation {
            Relation::Orders => self.orders_to_batch(dataset),
            Relation::OrderItems => self.order_items_to_batch(dataset),
            Relation::Products => self.products_to_batch(dataset),
            Relation::CategoryTranslation => self.translations_to_batch(dataset),
            Relation::Payments => self.payments_to_batch(dataset),
            Relation::Reviews => self.reviews_to_batch(dataset),
        }
    }

    pub fn orders_to_batch(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let orders = &dataset.orders;
        let ids: StringArray = orders.iter().map(|o| Some(o.order_id.as_str())).collect();
        let customers: StringArray = orders.iter().map(|o| Some(o.customer_id.as_str())).collect();
        let statuses: StringArray = orders.iter().map(|o| Some(o.status.as_str())).collect();
        let purchased: StringArray = orders
            .iter()
            .map(|o| Some(fmt_ts(&o.purchase_timestamp)))
            .collect();
        let delivered: StringArray = orders
            .iter()
            .map(|o| o.delivered_customer_date.as_ref().map(fmt_ts))
            .collect();
        let estimated: StringArray = orders
            .iter()
            .map(|o| o.estimated_delivery_date.as_ref().map(fmt_ts))
            .collect();

        batch(
            vec![
                Field::new("order_id", DataType::Utf8, false),
                Field::new("customer_id", DataType::Utf8, false),
                Field::new("order_status", DataType::Utf8, false),
                Field::new("order_purchase_timestamp", DataType::Utf8, false),
                Field::new("order_delivered_customer_date", DataType::Utf8, true),
                Field::new("order_estimated_delivery_date", DataType::Utf8, true),
            ],
            vec![
                Arc::new(ids) as ArrayRef,
                Arc::new(customers) as ArrayRef,
                Arc::new(statuses) as ArrayRef,
                Arc::new(purchased) as ArrayRef,
                Arc::new(delivered) as ArrayRef,
                Arc::new(estimated) as ArrayRef,
            ],
        )
    }

    pub fn order_items_to_batch(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let items = &dataset.order_items;
        let order_ids: StringArray = items.iter().map(|i| Some(i.order_id.as_str())).collect();
        let positions: Int64Array = items.iter().map(|i| Some(i.order_item_id as i64)).collect();
        let product_ids: StringArray = items.iter().map(|i| Some(i.product_id.as_str())).collect();
        let seller_ids: StringArray = items.iter().map(|i| Some(i.seller_id.as_str())).collect();
        let prices: Float64Array = items.iter().map(|i| Some(i.price)).collect();
        let freight: Float64Array = items.iter().map(|i| Some(i.freight_value)).collect();

        batch(
            vec![
                Field::new("order_id", DataType::Utf8, false),
                Field::new("order_item_id", DataType::Int64, false),
                Field::new("product_id", DataType::Utf8, false),
                Field::new("seller_id", DataType::Utf8, false),
                Field::new("price", DataType::Float64, false),
                Field::new("freight_value", DataType::Float64, false),
            ],
            vec![
                Arc::new(order_ids) as ArrayRef,
                Arc::new(positions) as ArrayRef,
                Arc::new(product_ids) as ArrayRef,
                Arc::new(seller_ids) as ArrayRef,
                Arc::new(prices) as ArrayRef,
                Arc::new(freight) as ArrayRef,
            ],
        )
    }

    pub fn products_to_batch(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let products = &dataset.products;
        let ids: StringArray = products.iter().map(|p| Some(p.product_id.as_str())).collect();
        let categories: StringArray = products
            .iter()
            .map(|p| p.category_name.as_deref())
            .collect();

        batch(
            vec![
                Field::new("product_id", DataType::Utf8, false),
                Field::new("product_category_name", DataType::Utf8, true),
            ],
            vec![Arc::new(ids) as ArrayRef, Arc::new(categories) as ArrayRef],
        )
    }

    pub fn translations_to_batch(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let rows = &dataset.category_translations;
        let names: StringArray = rows.iter().map(|t| Some(t.category_name.as_str())).collect();
        let english: StringArray = rows
            .iter()
            .map(|t| Some(t.category_name_english.as_str()))
            .collect();

        batch(
            vec![
                Field::new("product_category_name", DataType::Utf8, false),
                Field::new("product_category_name_english", DataType::Utf8, false),
            ],
            vec![Arc::new(names) as ArrayRef, Arc::new(english) as ArrayRef],
        )
    }

    pub fn payments_to_batch(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let payments = &dataset.payments;
        let order_ids: StringArray = payments.iter().map(|p| Some(p.order_id.as_str())).collect();
        let sequentials: Int64Array = payments
            .iter()
            .map(|p| Some(p.payment_sequential as i64))
            .collect();
        let types: StringArray = payments
            .iter()
            .map(|p| Some(p.payment_type.as_str()))
            .collect();
        let installments: Int64Array = payments
            .iter()
            .map(|p| Some(p.payment_installments as i64))
            .collect();
        let values: Float64Array = payments.iter().map(|p| Some(p.payment_value)).collect();

        batch(
            vec![
                Field::new("order_id", DataType::Utf8, false),
                Field::new("payment_sequential", DataType::Int64, false),
                Field::new("payment_type", DataType::Utf8, false),
                Field::new("payment_installments", DataType::Int64, false),
                Field::new("payment_value", DataType::Float64, false),
            ],
            vec![
                Arc::new(order_ids) as ArrayRef,
                Arc::new(sequentials) as ArrayRef,
                Arc::new(types) as ArrayRef,
                Arc::new(installments) as ArrayRef,
                Arc::new(values) as ArrayRef,
            ],
        )
    }

    pub fn reviews_to_batch(&self, dataset: &Dataset) -> Result<RecordBatch> {
        let reviews = &dataset.reviews;
        let ids: StringArray = reviews.iter().map(|r| Some(r.review_id.as_str())).collect();
        let order_ids: StringArray = reviews.iter().map(|r| Some(r.order_id.as_str())).collect();
        let scores: Int64Array = reviews.iter().map(|r| r.score.map(i64::from)).collect();

        batch(
            vec![
                Field::new("review_id", DataType::Utf8, false),
                Field::new("order_id", DataType::Utf8, false),
                Field::new("review_score", DataType::Int64, true),
            ],
            vec![
                Arc::new(ids) as ArrayRef,
                Arc::new(order_ids) as ArrayRef,
                Arc::new(scores) as ArrayRef,
            ],
        )
    }
}

impl Default for ArrowOutput {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// CSV Output
// ----------------------------------------------------------------------------

/// CSV output format - one file per relation, named like the public export
/// of the dataset so a CSV loader can read the directory back.
pub struct CsvOutput {
    arrow: ArrowOutput,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self {
            arrow: ArrowOutput::new(),
        }
    }

    /// Write all six relations into `dir`, creating it if needed.
    ///
    /// Returns the number of data rows written.
    pub fn write_dataset(&self, dir: &Path, dataset: &Dataset) -> Result<usize> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

        let mut rows = 0;
        for relation in Relation::ALL {
            let path = dir.join(relation.default_csv_file());
            let batch = self.arrow.relation_to_batch(dataset, relation)?;

            let file = File::create(&path)
                .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
            let mut writer = Writer::new(file);
            writer
                .write(&batch)
                .with_context(|| format!("Failed to write {}", relation))?;

            rows += batch.num_rows();
        }

        Ok(rows)
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}
