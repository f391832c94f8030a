//! DuckDB loader implementation for marketfit.
//!
//! Reads the six source relations either from tables inside a DuckDB database
//! file or from CSV files registered as views over `read_csv_auto`.

mod decode;

use anyhow::Context;
use arrow::array::RecordBatch;
use async_trait::async_trait;
use duckdb::Connection;
use marketfit_source::{
    CategoryTranslation, DataSource, Order, OrderItem, Payment, Product, Relation, Review,
    SourceError, SourceKind,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// DuckDB-backed data source.
///
/// DuckDB operations are synchronous, so they're wrapped in spawn_blocking.
/// Uses Arc<Mutex<Connection>> since Connection is not Sync.
pub struct DuckDbSource {
    connection: Arc<Mutex<Connection>>,
    schema: String,
    kind: SourceKind,
}

impl DuckDbSource {
    /// Open an existing DuckDB database and read relations from `schema`.
    pub async fn open(database_path: &Path, schema: &str) -> Result<Self, SourceError> {
        if !database_path.exists() {
            return Err(SourceError::connection_failed(format!(
                "database file not found: {}",
                database_path.display()
            )));
        }

        let database_path = database_path.to_owned();

        let connection = tokio::task::spawn_blocking(move || {
            let connection = Connection::open(&database_path)
                .with_context(|| format!("Failed to open DuckDB database: {:?}", database_path))?;
            Ok::<_, anyhow::Error>(Arc::new(Mutex::new(connection)))
        })
        .await
        .map_err(|e| SourceError::connection_failed(e.to_string()))?
        .map_err(|e| SourceError::connection_failed(e.to_string()))?;

        Ok(Self {
            connection,
            schema: schema.to_string(),
            kind: SourceKind::DuckDb,
        })
    }

    /// Register a directory of CSV files using the dataset's default file names.
    pub async fn from_csv_dir(dir: &Path) -> Result<Self, SourceError> {
        let files = Relation::ALL
            .into_iter()
            .map(|r| (r, dir.join(r.default_csv_file())))
            .collect();
        Self::from_csv_files(files).await
    }

    /// Register one CSV file per relation as a view in an in-memory database.
    ///
    /// Relations whose file does not exist get no view, so loading them later
    /// reports `DataUnavailable`. A file DuckDB cannot read fails here with
    /// `DataUnavailable` for its relation.
    pub async fn from_csv_files(files: Vec<(Relation, PathBuf)>) -> Result<Self, SourceError> {
        let connection = tokio::task::spawn_blocking(move || {
            let connection = Connection::open_in_memory()
                .map_err(|e| SourceError::connection_failed(e.to_string()))?;

            for (relation, path) in &files {
                if !path.is_file() {
                    tracing::warn!(relation = %relation, path = %path.display(), "CSV file not found");
                    continue;
                }

                let escaped = path.to_string_lossy().replace('\'', "''");
                let sql = format!(
                    "CREATE VIEW {} AS SELECT * FROM read_csv_auto('{}', header = true)",
                    relation.table_name(),
                    escaped
                );
                connection.execute(&sql, []).map_err(|e| {
                    SourceError::data_unavailable(
                        *relation,
                        format!("cannot read {}: {}", path.display(), e),
                    )
                })?;

                tracing::debug!(relation = %relation, path = %path.display(), "registered CSV view");
            }

            Ok::<_, SourceError>(Arc::new(Mutex::new(connection)))
        })
        .await
        .map_err(|e| SourceError::connection_failed(e.to_string()))??;

        Ok(Self {
            connection,
            schema: "main".to_string(),
            kind: SourceKind::Csv,
        })
    }

    fn qualified(&self, relation: Relation) -> String {
        format!("{}.{}", self.schema, relation.table_name())
    }

    /// Run a projection over a relation and collect the Arrow result.
    async fn query_relation(
        &self,
        relation: Relation,
        columns: &[&str],
    ) -> Result<Vec<RecordBatch>, SourceError> {
        let sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            self.qualified(relation)
        );
        let connection = Arc::clone(&self.connection);

        let batches = tokio::task::spawn_blocking(move || {
            let conn = connection
                .lock()
                .map_err(|_| SourceError::connection_failed("DuckDB connection lock poisoned"))?;
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| SourceError::data_unavailable(relation, e.to_string()))?;

            let result = stmt
                .query_arrow([])
                .map_err(|e| SourceError::data_unavailable(relation, e.to_string()))?;

            Ok::<_, SourceError>(result.collect::<Vec<_>>())
        })
        .await
        .map_err(|e| SourceError::Other(e.into()))??;

        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        tracing::debug!(relation = %relation, rows, "read relation");

        Ok(batches)
    }
}

/// `CAST(col AS type) AS col`
fn cast(column: &str, sql_type: &str) -> String {
    format!("CAST({column} AS {sql_type}) AS {column}")
}

#[async_trait]
impl DataSource for DuckDbSource {
    async fn relation_exists(&self, relation: Relation) -> Result<bool, SourceError> {
        let query = "SELECT COUNT(*) > 0 FROM information_schema.tables WHERE table_schema = ? AND table_name = ?";
        let connection = Arc::clone(&self.connection);
        let schema = self.schema.clone();
        let table_name = relation.table_name().to_string();

        tokio::task::spawn_blocking(move || {
            let conn = connection
                .lock()
                .map_err(|_| SourceError::connection_failed("DuckDB connection lock poisoned"))?;
            conn.query_row(query, [&schema, &table_name], |row| row.get(0))
                .map_err(|e| SourceError::data_unavailable(relation, e.to_string()))
        })
        .await
        .map_err(|e| SourceError::Other(e.into()))?
    }

    async fn load_orders(&self) -> Result<Vec<Order>, SourceError> {
        let columns = [
            cast("order_id", "VARCHAR"),
            cast("customer_id", "VARCHAR"),
            cast("order_status", "VARCHAR"),
            cast("order_purchase_timestamp", "VARCHAR"),
            cast("order_estimated_delivery_date", "VARCHAR"),
            cast("order_delivered_customer_date", "VARCHAR"),
        ];
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let batches = self.query_relation(Relation::Orders, &columns).await?;
        decode::orders(&batches)
    }

    async fn load_order_items(&self) -> Result<Vec<OrderItem>, SourceError> {
        let columns = [
            cast("order_id", "VARCHAR"),
            cast("order_item_id", "BIGINT"),
            cast("product_id", "VARCHAR"),
            cast("seller_id", "VARCHAR"),
            cast("price", "DOUBLE"),
            cast("freight_value", "DOUBLE"),
        ];
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let batches = self.query_relation(Relation::OrderItems, &columns).await?;
        decode::order_items(&batches)
    }

    async fn load_products(&self) -> Result<Vec<Product>, SourceError> {
        let columns = [
            cast("product_id", "VARCHAR"),
            cast("product_category_name", "VARCHAR"),
        ];
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let batches = self.query_relation(Relation::Products, &columns).await?;
        decode::products(&batches)
    }

    async fn load_category_translations(&self) -> Result<Vec<CategoryTranslation>, SourceError> {
        let columns = [
            cast("product_category_name", "VARCHAR"),
            cast("product_category_name_english", "VARCHAR"),
        ];
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let batches = self
            .query_relation(Relation::CategoryTranslation, &columns)
            .await?;
        decode::category_translations(&batches)
    }

    async fn load_payments(&self) -> Result<Vec<Payment>, SourceError> {
        let columns = [
            cast("order_id", "VARCHAR"),
            cast("payment_sequential", "BIGINT"),
            cast("payment_type", "VARCHAR"),
            cast("payment_installments", "BIGINT"),
            cast("payment_value", "DOUBLE"),
        ];
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let batches = self.query_relation(Relation::Payments, &columns).await?;
        decode::payments(&batches)
    }

    async fn load_reviews(&self) -> Result<Vec<Review>, SourceError> {
        let columns = [
            cast("review_id", "VARCHAR"),
            cast("order_id", "VARCHAR"),
            cast("review_score", "BIGINT"),
        ];
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let batches = self.query_relation(Relation::Reviews, &columns).await?;
        decode::reviews(&batches)
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketfit_source::OrderStatus;
    use marketfit_testdata::{CsvOutput, Fixture};
    use tempfile::TempDir;

    fn seed_database(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "
            CREATE TABLE orders (
                order_id VARCHAR, customer_id VARCHAR, order_status VARCHAR,
                order_purchase_timestamp TIMESTAMP,
                order_estimated_delivery_date TIMESTAMP,
                order_delivered_customer_date TIMESTAMP
            );
            INSERT INTO orders VALUES
                ('o1', 'c1', 'delivered', '2018-03-01 10:00:00', '2018-03-10 00:00:00', '2018-03-15 12:00:00'),
                ('o2', 'c2', 'shipped', '2018-03-02 11:00:00', '2018-03-12 00:00:00', NULL);

            CREATE TABLE order_items (
                order_id VARCHAR, order_item_id INTEGER, product_id VARCHAR,
                seller_id VARCHAR, price DECIMAL(10,2), freight_value DECIMAL(10,2)
            );
            INSERT INTO order_items VALUES
                ('o1', 1, 'p1', 's1', 150.00, 12.50),
                ('o2', 1, 'p2', 's2', 80.00, 9.90);

            CREATE TABLE products (product_id VARCHAR, product_category_name VARCHAR);
            INSERT INTO products VALUES ('p1', 'eletronicos'), ('p2', NULL);

            CREATE TABLE product_category_name_translation (
                product_category_name VARCHAR, product_category_name_english VARCHAR
            );
            INSERT INTO product_category_name_translation VALUES ('eletronicos', 'electronics');

            CREATE TABLE order_payments (
                order_id VARCHAR, payment_sequential INTEGER, payment_type VARCHAR,
                payment_installments INTEGER, payment_value DOUBLE
            );
            INSERT INTO order_payments VALUES
                ('o1', 1, 'credit_card', 3, 30.00),
                ('o1', 2, 'voucher', 1, 45.50);

            CREATE TABLE order_reviews (review_id VARCHAR, order_id VARCHAR, review_score INTEGER);
            INSERT INTO order_reviews VALUES ('r1', 'o1', 4), ('r2', 'o2', NULL);
            ",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_load_dataset_from_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("market.duckdb");
        seed_database(&db_path);

        let source = DuckDbSource::open(&db_path, "main").await.unwrap();
        let dataset = source.load_dataset().await.unwrap();

        assert_eq!(source.kind(), SourceKind::DuckDb);
        assert_eq!(dataset.orders.len(), 2);
        assert_eq!(dataset.order_items.len(), 2);
        assert_eq!(dataset.payments.len(), 2);

        let o1 = dataset.orders.iter().find(|o| o.order_id == "o1").unwrap();
        assert_eq!(o1.status, OrderStatus::Delivered);
        assert!(o1.has_delivery_dates());

        let o2 = dataset.orders.iter().find(|o| o.order_id == "o2").unwrap();
        assert!(o2.delivered_customer_date.is_none());

        let p2 = dataset.products.iter().find(|p| p.product_id == "p2").unwrap();
        assert!(p2.category_name.is_none());

        let item = dataset.order_items.iter().find(|i| i.order_id == "o1").unwrap();
        assert!((item.price - 150.0).abs() < 1e-9);

        let unscored = dataset.reviews.iter().find(|r| r.review_id == "r2").unwrap();
        assert_eq!(unscored.score, None);
    }

    #[tokio::test]
    async fn test_missing_table_is_data_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("market.duckdb");
        seed_database(&db_path);
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("DROP TABLE order_reviews", []).unwrap();
        }

        let source = DuckDbSource::open(&db_path, "main").await.unwrap();
        assert!(!source.relation_exists(Relation::Reviews).await.unwrap());

        let err = source.load_dataset().await.unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[tokio::test]
    async fn test_open_missing_database_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = DuckDbSource::open(&temp_dir.path().join("nope.duckdb"), "main").await;
        assert!(matches!(result, Err(SourceError::ConnectionFailed { .. })));
    }

    #[tokio::test]
    async fn test_csv_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = Fixture::new()
            .order("o1", "2018-03-01", Some(("2018-03-10", "2018-03-15")))
            .item("o1", "p1", "s1", 150.0)
            .item("o1", "p2", "s1", 40.0)
            .product("p1", Some("eletronicos"))
            .product("p2", Some("brinquedos"))
            .translation("eletronicos", "electronics")
            .payment("o1", 30.0)
            .payment("o1", 45.5)
            .review("o1", Some(5))
            .build();

        CsvOutput::new()
            .write_dataset(temp_dir.path(), &fixture)
            .unwrap();

        let source = DuckDbSource::from_csv_dir(temp_dir.path()).await.unwrap();
        let dataset = source.load_dataset().await.unwrap();

        assert_eq!(source.kind(), SourceKind::Csv);
        assert_eq!(dataset.orders, fixture.orders);
        assert_eq!(dataset.order_items.len(), 2);
        assert_eq!(dataset.products.len(), 2);
        assert_eq!(dataset.category_translations, fixture.category_translations);
        assert_eq!(dataset.payments.len(), 2);
        assert_eq!(dataset.reviews[0].score, Some(5));
    }

    #[tokio::test]
    async fn test_csv_missing_file_is_data_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = Fixture::new()
            .order("o1", "2018-03-01", None)
            .item("o1", "p1", "s1", 10.0)
            .product("p1", None)
            .build();
        CsvOutput::new()
            .write_dataset(temp_dir.path(), &fixture)
            .unwrap();
        std::fs::remove_file(temp_dir.path().join(Relation::Payments.default_csv_file())).unwrap();

        let source = DuckDbSource::from_csv_dir(temp_dir.path()).await.unwrap();
        match source.load_dataset().await {
            Err(SourceError::DataUnavailable { relation, .. }) => {
                assert_eq!(relation, Relation::Payments)
            }
            other => panic!("expected DataUnavailable, got {:?}", other.map(|d| d.summary())),
        }
    }

    #[tokio::test]
    async fn test_csv_unreadable_file_names_its_relation() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = Fixture::new()
            .order("o1", "2018-03-01", None)
            .item("o1", "p1", "s1", 10.0)
            .product("p1", None)
            .build();
        CsvOutput::new()
            .write_dataset(temp_dir.path(), &fixture)
            .unwrap();
        std::fs::write(temp_dir.path().join(Relation::Payments.default_csv_file()), "").unwrap();

        // DuckDB may reject the file when the view is created or when it is queried
        let result = match DuckDbSource::from_csv_dir(temp_dir.path()).await {
            Ok(source) => source.load_dataset().await.map(|d| d.summary()),
            Err(e) => Err(e),
        };
        match result {
            Err(SourceError::DataUnavailable { relation, .. }) => {
                assert_eq!(relation, Relation::Payments)
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }
}
