//! Flat report tables.
//!
//! [`ReportEmitter`] turns an [`Aggregation`] into a [`ReportTable`]: key
//! columns first, then one column per metric. Tables convert to Arrow
//! `RecordBatch`es for export and terminal preview.

use crate::aggregate::{round2, Aggregation, MetricColumn, MetricType, MetricValue, Summary};
use crate::error::PipelineError;
use crate::segment::Segment;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Name of the trailing column carrying per-group errors.
pub const ERROR_COLUMN: &str = "error";

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.2}", v),
            Value::Text(s) => f.write_str(s),
            Value::Null => f.write_str("NULL"),
        }
    }
}

impl From<MetricValue> for Value {
    fn from(value: MetricValue) -> Self {
        match value {
            MetricValue::Count(n) => Value::Int(n as i64),
            MetricValue::Number(Some(v)) => Value::Float(round2(v)),
            MetricValue::Number(None) => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    fn data_type(&self) -> DataType {
        match self {
            ColumnType::Int => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Text => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

impl From<&MetricColumn> for Column {
    fn from(column: &MetricColumn) -> Self {
        let column_type = match column.metric_type {
            MetricType::Count => ColumnType::Int,
            MetricType::Number => ColumnType::Float,
        };
        Column::new(column.name.clone(), column_type)
    }
}

/// An ordered, flat result table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl ReportTable {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_errors(&self) -> bool {
        self.column_index(ERROR_COLUMN).is_some()
    }

    /// Cell at `row`, `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// First row whose first column renders as `key`.
    pub fn find_row(&self, key: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.first().is_some_and(|v| v.to_string() == key))
    }

    /// Cell in the row keyed by `key`.
    pub fn lookup(&self, key: &str, column: &str) -> Option<&Value> {
        self.value(self.find_row(key)?, column)
    }

    /// Add a derived column, placed before the error column if there is one.
    pub fn add_column(&mut self, column: Column, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let at = self.column_index(ERROR_COLUMN).unwrap_or(self.columns.len());
        self.columns.insert(at, column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(at, value);
        }
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch, PipelineError> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(&c.name, c.column_type.data_type(), true))
            .collect();

        let arrays: Vec<ArrayRef> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let cells = self.rows.iter().map(move |row| &row[i]);
                match column.column_type {
                    ColumnType::Int => Arc::new(
                        cells
                            .map(|v| match v {
                                Value::Int(n) => Some(*n),
                                _ => None,
                            })
                            .collect::<Int64Array>(),
                    ) as ArrayRef,
                    ColumnType::Float => {
                        Arc::new(cells.map(Value::as_f64).collect::<Float64Array>()) as ArrayRef
                    }
                    ColumnType::Text => {
                        Arc::new(cells.map(Value::as_str).collect::<StringArray>()) as ArrayRef
                    }
                }
            })
            .collect();

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(|source| {
            PipelineError::Arrow {
                report: self.name.clone(),
                source,
            }
        })
    }
}

/// A grouping key that can be rendered as one or more cells.
pub trait GroupKey: Ord + Clone {
    /// Cell types, one per key column.
    fn types() -> Vec<ColumnType>;

    fn values(&self) -> Vec<Value>;
}

impl GroupKey for i32 {
    fn types() -> Vec<ColumnType> {
        vec![ColumnType::Int]
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Int(i64::from(*self))]
    }
}

impl GroupKey for String {
    fn types() -> Vec<ColumnType> {
        vec![ColumnType::Text]
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.clone())]
    }
}

impl GroupKey for Option<String> {
    fn types() -> Vec<ColumnType> {
        vec![ColumnType::Text]
    }

    fn values(&self) -> Vec<Value> {
        vec![self.clone().map_or(Value::Null, Value::Text)]
    }
}

impl GroupKey for Segment {
    fn types() -> Vec<ColumnType> {
        vec![ColumnType::Text]
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.label().to_string())]
    }
}

/// Calendar month key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self::new(ts.year(), ts.month())
    }

    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Every month from `start` to `end`, both included.
    pub fn range(start: YearMonth, end: YearMonth) -> Vec<YearMonth> {
        std::iter::successors(Some(start), |m| Some(m.next()))
            .take_while(|m| *m <= end)
            .collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl GroupKey for YearMonth {
    fn types() -> Vec<ColumnType> {
        vec![ColumnType::Int, ColumnType::Int]
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Int(i64::from(self.year)), Value::Int(i64::from(self.month))]
    }
}

/// Converts aggregations into report tables. No I/O.
pub struct ReportEmitter {
    name: String,
    key_names: Vec<String>,
}

impl ReportEmitter {
    /// `key_names` labels the key columns, one per cell of the key type.
    pub fn new(name: impl Into<String>, key_names: &[&str]) -> Self {
        Self {
            name: name.into(),
            key_names: key_names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Rows in key order.
    pub fn emit<K: GroupKey>(&self, aggregation: &Aggregation<K>) -> ReportTable {
        let entries: Vec<(&K, &Summary)> = aggregation.iter().collect();
        self.build(aggregation, entries)
    }

    /// Rows by `metric` descending, ties by key ascending, at most `limit`.
    ///
    /// Groups without a value for `metric` sort last.
    pub fn emit_ranked<K: GroupKey>(
        &self,
        aggregation: &Aggregation<K>,
        metric: &str,
        limit: usize,
    ) -> ReportTable {
        let rank = |group: &Summary| group.number(metric);

        let mut entries: Vec<(&K, &Summary)> = aggregation.iter().collect();
        entries.sort_by(|(ka, a), (kb, b)| match (rank(a), rank(b)) {
            (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| ka.cmp(kb)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => ka.cmp(kb),
        });
        entries.truncate(limit);

        self.build(aggregation, entries)
    }

    fn build<K: GroupKey>(
        &self,
        aggregation: &Aggregation<K>,
        entries: Vec<(&K, &Summary)>,
    ) -> ReportTable {
        let metrics = aggregation.columns();
        let failed = entries.iter().any(|(_, g)| !g.is_ok());

        let mut columns: Vec<Column> = self
            .key_names
            .iter()
            .zip(K::types())
            .map(|(name, column_type)| Column::new(name.clone(), column_type))
            .collect();
        columns.extend(metrics.iter().map(Column::from));
        if failed {
            columns.push(Column::new(ERROR_COLUMN, ColumnType::Text));
        }

        let mut table = ReportTable::new(self.name.clone(), columns);
        for (key, group) in entries {
            let mut row = key.values();
            row.extend(group.values().iter().map(|(_, v)| Value::from(*v)));
            match group.error() {
                Some(e) => {
                    tracing::warn!(report = %self.name, error = %e, "group failed");
                    row.push(Value::Text(e.to_string()));
                }
                None if failed => row.push(Value::Null),
                None => {}
            }
            table.push_row(row);
        }

        table
    }
}
