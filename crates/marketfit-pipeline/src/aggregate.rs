//! Grouped statistics over arbitrary rows.
//!
//! An [`Aggregator`] partitions rows by a key function and evaluates a list of
//! [`MetricSpec`]s per group. Groups come back ordered by key as [`Summary`]s.
//! A metric that is undefined for a group (an average over zero rows, a row
//! outside every bucket) leaves its columns null and attaches the
//! [`AggregateError`] to that group. The group's counts are still reported and
//! the other groups are unaffected.

use crate::error::AggregateError;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

/// Extracts a numeric field; `None` is a null and is left out of the metric.
pub type FieldFn<R> = Box<dyn Fn(&R) -> Option<f64> + Send + Sync>;
pub type PredicateFn<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;
pub type LabelFn<R> = Box<dyn Fn(&R) -> Option<String> + Send + Sync>;
pub type DateFn<R> = Box<dyn Fn(&R) -> Option<NaiveDateTime> + Send + Sync>;

/// Whole calendar days from `b` to `a`; times of day are ignored.
///
/// `date_delta(2018-03-15, 2018-03-10) == 5`
pub fn date_delta(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    (a.date() - b.date()).num_days()
}

/// `100 * hits / total` rounded half-up to 2 decimals, or `None` when `total == 0`.
///
/// Computed in integer hundredths so that e.g. 1/8 is exactly 12.50.
pub fn share_pct(hits: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let (hits, total) = (hits as u128, total as u128);
    let hundredths = (20_000 * hits + total) / (2 * total);
    Some(hundredths as f64 / 100.0)
}

/// Round to 2 decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A named set of bucket predicates meant to be mutually exclusive and
/// exhaustive over the rows it is applied to.
pub struct BucketSet<R> {
    name: String,
    buckets: Vec<(String, PredicateFn<R>)>,
}

impl<R> BucketSet<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buckets: Vec::new(),
        }
    }

    pub fn bucket(
        mut self,
        label: impl Into<String>,
        predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.buckets.push((label.into(), Box::new(predicate)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(label, _)| label.as_str())
    }

    /// Index of the single bucket `row` falls in.
    pub fn classify(&self, row: &R, index: usize) -> Result<usize, AggregateError> {
        let hits: Vec<usize> = self
            .buckets
            .iter()
            .enumerate()
            .filter(|(_, (_, predicate))| predicate(row))
            .map(|(i, _)| i)
            .collect();

        match hits.as_slice() {
            [single] => Ok(*single),
            [] => Err(AggregateError::BucketGap {
                set: self.name.clone(),
                row: index,
            }),
            many => Err(AggregateError::BucketOverlap {
                set: self.name.clone(),
                buckets: many.iter().map(|i| self.buckets[*i].0.clone()).collect(),
            }),
        }
    }
}

/// What a metric computes.
pub enum MetricKind<R> {
    /// Rows in the group
    Count,
    /// Rows satisfying a predicate
    CountIf(PredicateFn<R>),
    /// Distinct non-null labels
    CountDistinct(LabelFn<R>),
    Sum(FieldFn<R>),
    /// Arithmetic mean of the non-null values
    Avg(FieldFn<R>),
    Min(FieldFn<R>),
    Max(FieldFn<R>),
    /// Mean of `date_delta(later, earlier)` over rows with both dates
    DateDelta { later: DateFn<R>, earlier: DateFn<R> },
    /// Percentage of rows satisfying a predicate
    BucketShare(PredicateFn<R>),
    /// One percentage per bucket of an exclusive, exhaustive set
    Partition(BucketSet<R>),
}

/// Output type of a metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Count,
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub name: String,
    pub metric_type: MetricType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(u64),
    /// `None` when every input was null
    Number(Option<f64>),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Count(n) => Some(*n as f64),
            MetricValue::Number(v) => *v,
        }
    }
}

/// A named metric.
pub struct MetricSpec<R> {
    name: String,
    kind: MetricKind<R>,
}

impl<R> MetricSpec<R> {
    pub fn new(name: impl Into<String>, kind: MetricKind<R>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Count)
    }

    pub fn count_if(
        name: impl Into<String>,
        predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::CountIf(Box::new(predicate)))
    }

    pub fn count_distinct(
        name: impl Into<String>,
        label: impl Fn(&R) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::CountDistinct(Box::new(label)))
    }

    pub fn sum(
        name: impl Into<String>,
        field: impl Fn(&R) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::Sum(Box::new(field)))
    }

    pub fn avg(
        name: impl Into<String>,
        field: impl Fn(&R) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::Avg(Box::new(field)))
    }

    pub fn min(
        name: impl Into<String>,
        field: impl Fn(&R) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::Min(Box::new(field)))
    }

    pub fn max(
        name: impl Into<String>,
        field: impl Fn(&R) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::Max(Box::new(field)))
    }

    /// Average whole-day difference `later - earlier`.
    pub fn date_delta(
        name: impl Into<String>,
        later: impl Fn(&R) -> Option<NaiveDateTime> + Send + Sync + 'static,
        earlier: impl Fn(&R) -> Option<NaiveDateTime> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            name,
            MetricKind::DateDelta {
                later: Box::new(later),
                earlier: Box::new(earlier),
            },
        )
    }

    pub fn bucket_share(
        name: impl Into<String>,
        predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, MetricKind::BucketShare(Box::new(predicate)))
    }

    /// One share column per bucket, named `{prefix}{label}`.
    pub fn partition(prefix: impl Into<String>, buckets: BucketSet<R>) -> Self {
        Self::new(prefix, MetricKind::Partition(buckets))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ratios and averages have no value over zero rows.
    fn requires_rows(&self) -> bool {
        matches!(
            self.kind,
            MetricKind::Avg(_)
                | MetricKind::DateDelta { .. }
                | MetricKind::BucketShare(_)
                | MetricKind::Partition(_)
        )
    }

    fn columns(&self) -> Vec<MetricColumn> {
        let column = |name: String, metric_type| MetricColumn { name, metric_type };
        match &self.kind {
            MetricKind::Count | MetricKind::CountIf(_) | MetricKind::CountDistinct(_) => {
                vec![column(self.name.clone(), MetricType::Count)]
            }
            MetricKind::Partition(set) => set
                .labels()
                .map(|label| column(format!("{}{}", self.name, label), MetricType::Number))
                .collect(),
            _ => vec![column(self.name.clone(), MetricType::Number)],
        }
    }

    fn evaluate(&self, rows: &[&R]) -> Result<Vec<MetricValue>, AggregateError> {
        if rows.is_empty() && self.requires_rows() {
            return Err(AggregateError::EmptyGroup {
                metric: self.name.clone(),
            });
        }

        let values = |field: &FieldFn<R>| -> Vec<f64> {
            rows.iter()
                .filter_map(|r| field(r))
                .filter(|v| !v.is_nan())
                .collect()
        };

        let value = match &self.kind {
            MetricKind::Count => MetricValue::Count(rows.len() as u64),
            MetricKind::CountIf(predicate) => {
                MetricValue::Count(rows.iter().filter(|r| predicate(r)).count() as u64)
            }
            MetricKind::CountDistinct(label) => {
                let distinct: BTreeSet<String> = rows.iter().filter_map(|r| label(r)).collect();
                MetricValue::Count(distinct.len() as u64)
            }
            MetricKind::Sum(field) => {
                let v = values(field);
                MetricValue::Number((!v.is_empty()).then(|| v.iter().sum()))
            }
            MetricKind::Avg(field) => {
                let v = values(field);
                MetricValue::Number((!v.is_empty()).then(|| v.iter().sum::<f64>() / v.len() as f64))
            }
            MetricKind::Min(field) => MetricValue::Number(values(field).into_iter().reduce(f64::min)),
            MetricKind::Max(field) => MetricValue::Number(values(field).into_iter().reduce(f64::max)),
            MetricKind::DateDelta { later, earlier } => {
                let deltas: Vec<i64> = rows
                    .iter()
                    .filter_map(|r| Some(date_delta(later(r)?, earlier(r)?)))
                    .collect();
                MetricValue::Number(
                    (!deltas.is_empty())
                        .then(|| deltas.iter().sum::<i64>() as f64 / deltas.len() as f64),
                )
            }
            MetricKind::BucketShare(predicate) => {
                let hits = rows.iter().filter(|r| predicate(r)).count();
                MetricValue::Number(share_pct(hits, rows.len()))
            }
            MetricKind::Partition(set) => {
                let mut hits = vec![0usize; set.buckets.len()];
                for (i, row) in rows.iter().enumerate() {
                    hits[set.classify(row, i)?] += 1;
                }
                return Ok(hits
                    .into_iter()
                    .map(|h| MetricValue::Number(share_pct(h, rows.len())))
                    .collect());
            }
        };

        Ok(vec![value])
    }
}

/// Metric values of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    rows: usize,
    values: Vec<(String, MetricValue)>,
    error: Option<AggregateError>,
}

impl Summary {
    /// Rows that fell into the group.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            MetricValue::Count(n) => Some(n),
            MetricValue::Number(_) => None,
        }
    }

    /// Numeric value of a metric; counts are widened to f64.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn values(&self) -> &[(String, MetricValue)] {
        &self.values
    }

    /// First metric that was undefined for this group, if any.
    pub fn error(&self) -> Option<&AggregateError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of an aggregation: one entry per group, in key order.
#[derive(Debug, Clone)]
pub struct Aggregation<K> {
    columns: Vec<MetricColumn>,
    groups: BTreeMap<K, Summary>,
}

impl<K: Ord> Aggregation<K> {
    /// Metric columns in declaration order (partitions expanded).
    pub fn columns(&self) -> &[MetricColumn] {
        &self.columns
    }

    pub fn summary(&self, key: &K) -> Option<&Summary> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Summary)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Rows across every group; fan-out rows are counted once per group.
    pub fn total_rows(&self) -> usize {
        self.groups.values().map(Summary::rows).sum()
    }

    /// Number of groups carrying an error.
    pub fn failed_groups(&self) -> usize {
        self.groups.values().filter(|g| !g.is_ok()).count()
    }
}

enum KeyFn<R, K> {
    Single(Box<dyn Fn(&R) -> K + Send + Sync>),
    FanOut(Box<dyn Fn(&R) -> Vec<K> + Send + Sync>),
}

/// Builder-style grouped aggregation.
///
/// # Example
/// ```
/// use marketfit_pipeline::aggregate::{Aggregator, MetricSpec};
///
/// let scores = [1u8, 5, 5, 3, 5];
/// let result = Aggregator::new(|_: &u8| "all")
///     .metric(MetricSpec::count("reviews"))
///     .metric(MetricSpec::avg("avg_score", |s: &u8| Some(*s as f64)))
///     .metric(MetricSpec::bucket_share("pct_five_star", |s: &u8| *s == 5))
///     .run(&scores);
///
/// let summary = result.summary(&"all").unwrap();
/// assert_eq!(summary.count("reviews"), Some(5));
/// assert_eq!(summary.number("pct_five_star"), Some(60.0));
/// ```
pub struct Aggregator<R, K> {
    key_fn: KeyFn<R, K>,
    metrics: Vec<MetricSpec<R>>,
    seeded: Vec<K>,
}

impl<R, K: Ord + Clone> Aggregator<R, K> {
    /// Each row belongs to exactly one group.
    pub fn new(key_fn: impl Fn(&R) -> K + Send + Sync + 'static) -> Self {
        Self {
            key_fn: KeyFn::Single(Box::new(key_fn)),
            metrics: Vec::new(),
            seeded: Vec::new(),
        }
    }

    /// Each row may belong to several groups (e.g. `ALL_ITEMS` and `TECH_SEGMENT`).
    pub fn fan_out(keys_fn: impl Fn(&R) -> Vec<K> + Send + Sync + 'static) -> Self {
        Self {
            key_fn: KeyFn::FanOut(Box::new(keys_fn)),
            metrics: Vec::new(),
            seeded: Vec::new(),
        }
    }

    pub fn metric(mut self, spec: MetricSpec<R>) -> Self {
        self.metrics.push(spec);
        self
    }

    /// Groups that must appear in the output even when no row maps to them.
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.seeded.extend(keys);
        self
    }

    pub fn columns(&self) -> Vec<MetricColumn> {
        self.metrics.iter().flat_map(|m| m.columns()).collect()
    }

    pub fn run<'r>(&self, rows: impl IntoIterator<Item = &'r R>) -> Aggregation<K>
    where
        R: 'r,
    {
        let mut partitions: BTreeMap<K, Vec<&R>> = self
            .seeded
            .iter()
            .map(|k| (k.clone(), Vec::new()))
            .collect();

        for row in rows {
            match &self.key_fn {
                KeyFn::Single(key_fn) => partitions.entry(key_fn(row)).or_default().push(row),
                KeyFn::FanOut(keys_fn) => {
                    for key in keys_fn(row) {
                        partitions.entry(key).or_default().push(row);
                    }
                }
            }
        }

        let groups = partitions
            .into_iter()
            .map(|(key, rows)| {
                let summary = self.summarize(&rows);
                (key, summary)
            })
            .collect();

        Aggregation {
            columns: self.columns(),
            groups,
        }
    }

    fn summarize(&self, rows: &[&R]) -> Summary {
        let mut values = Vec::new();
        let mut error = None;
        for metric in &self.metrics {
            let names = metric.columns().into_iter().map(|c| c.name);
            match metric.evaluate(rows) {
                Ok(evaluated) => values.extend(names.zip(evaluated)),
                Err(e) => {
                    values.extend(names.map(|name| (name, MetricValue::Number(None))));
                    error.get_or_insert(e);
                }
            }
        }

        Summary {
            rows: rows.len(),
            values,
            error,
        }
    }
}

/// Group `rows` by `key_fn` and evaluate `metrics` per group.
pub fn aggregate<R, K: Ord + Clone>(
    rows: &[R],
    key_fn: impl Fn(&R) -> K + Send + Sync + 'static,
    metrics: Vec<MetricSpec<R>>,
) -> Aggregation<K> {
    metrics
        .into_iter()
        .fold(Aggregator::new(key_fn), Aggregator::metric)
        .run(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_date_delta_late_and_early() {
        let estimated = day(2018, 3, 10);
        assert_eq!(date_delta(day(2018, 3, 15), estimated), 5);
        assert_eq!(date_delta(day(2018, 3, 8), estimated), -2);
    }

    #[test]
    fn test_date_delta_truncates_time_of_day() {
        let late_night = NaiveDate::from_ymd_opt(2018, 3, 10)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let early_morning = NaiveDate::from_ymd_opt(2018, 3, 11)
            .unwrap()
            .and_hms_opt(0, 1, 0)
            .unwrap();
        assert_eq!(date_delta(early_morning, late_night), 1);
        assert_eq!(date_delta(late_night, day(2018, 3, 10)), 0);
    }

    #[test]
    fn test_date_delta_metric_averages_whole_days() {
        // (delivered, estimated)
        let orders = vec![
            (Some(day(2018, 3, 15)), Some(day(2018, 3, 10))),
            (Some(day(2018, 3, 8)), Some(day(2018, 3, 10))),
            (None, Some(day(2018, 3, 10))),
        ];
        type Row = (Option<NaiveDateTime>, Option<NaiveDateTime>);
        let result = aggregate(
            &orders,
            |_| (),
            vec![MetricSpec::date_delta("avg_delay", |r: &Row| r.0, |r: &Row| r.1)],
        );
        assert_eq!(result.summary(&()).unwrap().number("avg_delay"), Some(1.5));

        let empty: Vec<Row> = Vec::new();
        let result = Aggregator::new(|_: &Row| ())
            .with_keys([()])
            .metric(MetricSpec::date_delta("avg_delay", |r: &Row| r.0, |r: &Row| r.1))
            .run(&empty);
        assert!(matches!(
            result.summary(&()).unwrap().error(),
            Some(AggregateError::EmptyGroup { .. })
        ));
    }

    #[test]
    fn test_share_pct_rounding() {
        assert_eq!(share_pct(1, 10), Some(10.0));
        assert_eq!(share_pct(3, 5), Some(60.0));
        assert_eq!(share_pct(1, 3), Some(33.33));
        assert_eq!(share_pct(2, 3), Some(66.67));
        assert_eq!(share_pct(1, 8), Some(12.5));
        // 0.125% rounds half-up to 0.13
        assert_eq!(share_pct(1, 800), Some(0.13));
        assert_eq!(share_pct(0, 0), None);
    }

    #[test]
    fn test_rating_distribution() {
        let scores = vec![1u8, 5, 5, 3, 5];
        let result = aggregate(
            &scores,
            |_| (),
            vec![
                MetricSpec::count("reviews"),
                MetricSpec::count_if("count_5", |s: &u8| *s == 5),
                MetricSpec::bucket_share("pct_five_star", |s: &u8| *s == 5),
                MetricSpec::avg("avg_score", |s: &u8| Some(*s as f64)),
            ],
        );

        let summary = result.summary(&()).unwrap();
        assert_eq!(summary.count("count_5"), Some(3));
        assert_eq!(summary.number("pct_five_star"), Some(60.0));
        assert!((summary.number("avg_score").unwrap() - 3.8).abs() < 1e-9);
    }

    #[test]
    fn test_payment_fragments_are_summed() {
        let fragments = vec![("x", 30.00), ("x", 45.50), ("y", 10.0)];
        let result = aggregate(
            &fragments,
            |p: &(&str, f64)| p.0.to_string(),
            vec![MetricSpec::sum("total", |p: &(&str, f64)| Some(p.1))],
        );

        assert_eq!(result.summary(&"x".to_string()).unwrap().number("total"), Some(75.5));
        assert_eq!(result.summary(&"y".to_string()).unwrap().number("total"), Some(10.0));
    }

    #[test]
    fn test_nulls_are_excluded_not_zero() {
        let rows = vec![Some(2.0), None, Some(4.0)];
        let result = aggregate(
            &rows,
            |_| 0,
            vec![
                MetricSpec::count("rows"),
                MetricSpec::avg("avg", |v: &Option<f64>| *v),
                MetricSpec::min("min", |v: &Option<f64>| *v),
                MetricSpec::max("max", |v: &Option<f64>| *v),
                MetricSpec::sum("sum", |v: &Option<f64>| *v),
            ],
        );
        let summary = result.summary(&0).unwrap();

        assert_eq!(summary.count("rows"), Some(3));
        assert_eq!(summary.number("avg"), Some(3.0));
        assert_eq!(summary.number("min"), Some(2.0));
        assert_eq!(summary.number("max"), Some(4.0));
        assert_eq!(summary.number("sum"), Some(6.0));
    }

    #[test]
    fn test_all_null_metric_is_null() {
        let rows: Vec<Option<f64>> = vec![None, None];
        let result = aggregate(
            &rows,
            |_| 0,
            vec![
                MetricSpec::avg("avg", |v: &Option<f64>| *v),
                MetricSpec::sum("sum", |v: &Option<f64>| *v),
            ],
        );
        let summary = result.summary(&0).unwrap();
        assert_eq!(summary.get("avg"), Some(MetricValue::Number(None)));
        assert_eq!(summary.get("sum"), Some(MetricValue::Number(None)));
    }

    #[test]
    fn test_empty_seeded_group_is_attached_not_raised() {
        let rows = vec![10.0, 20.0];
        let result = Aggregator::new(|_: &f64| "present")
            .with_keys(["present", "missing"])
            .metric(MetricSpec::count("rows"))
            .metric(MetricSpec::avg("avg", |v: &f64| Some(*v)))
            .run(&rows);

        assert_eq!(result.len(), 2);
        assert_eq!(result.summary(&"present").unwrap().number("avg"), Some(15.0));

        let missing = result.summary(&"missing").unwrap();
        assert_eq!(
            missing.error(),
            Some(&AggregateError::EmptyGroup {
                metric: "avg".to_string()
            })
        );
        assert_eq!(missing.count("rows"), Some(0));
        assert_eq!(missing.get("avg"), Some(MetricValue::Number(None)));
        assert_eq!(result.failed_groups(), 1);
    }

    #[test]
    fn test_empty_group_keeps_counts_of_every_kind() {
        let rows = vec![("o1", 10.0)];
        let result = Aggregator::new(|r: &(&'static str, f64)| r.0)
            .with_keys(["o1", "o2"])
            .metric(MetricSpec::count("rows"))
            .metric(MetricSpec::count_if("big", |r: &(&str, f64)| r.1 > 5.0))
            .metric(MetricSpec::count_distinct("orders", |r: &(&str, f64)| {
                Some(r.0.to_string())
            }))
            .metric(MetricSpec::bucket_share("pct_big", |r: &(&str, f64)| r.1 > 5.0))
            .metric(MetricSpec::partition(
                "pct_",
                BucketSet::new("size").bucket("any", |_: &(&str, f64)| true),
            ))
            .run(&rows);

        let empty = result.summary(&"o2").unwrap();
        assert!(!empty.is_ok());
        assert_eq!(empty.count("rows"), Some(0));
        assert_eq!(empty.count("big"), Some(0));
        assert_eq!(empty.count("orders"), Some(0));
        assert_eq!(empty.number("pct_big"), None);
        assert_eq!(empty.number("pct_any"), None);
        assert_eq!(result.total_rows(), 1);
    }

    #[test]
    fn test_empty_group_without_ratios_is_fine() {
        let rows: Vec<f64> = Vec::new();
        let result = Aggregator::new(|_: &f64| 0)
            .with_keys([0])
            .metric(MetricSpec::count("rows"))
            .metric(MetricSpec::sum("sum", |v: &f64| Some(*v)))
            .run(&rows);

        let summary = result.summary(&0).unwrap();
        assert_eq!(summary.count("rows"), Some(0));
        assert_eq!(summary.number("sum"), None);
    }

    #[test]
    fn test_count_distinct() {
        let rows = vec![("o1", 1), ("o1", 2), ("o2", 3)];
        let result = aggregate(
            &rows,
            |_| (),
            vec![MetricSpec::count_distinct("orders", |r: &(&str, i32)| {
                Some(r.0.to_string())
            })],
        );
        assert_eq!(result.summary(&()).unwrap().count("orders"), Some(2));
    }

    #[test]
    fn test_fan_out_partition_is_complete() {
        let prices: Vec<f64> = (0..10).map(|i| i as f64 * 25.0).collect();
        let result = Aggregator::fan_out(|p: &f64| {
            if *p >= 100.0 {
                vec!["all", "high"]
            } else {
                vec!["all", "low"]
            }
        })
        .metric(MetricSpec::count("rows"))
        .run(&prices);

        let count = |k: &str| result.summary(&k).unwrap().count("rows").unwrap();
        assert_eq!(count("all"), 10);
        assert_eq!(count("all"), count("high") + count("low"));
    }

    fn price_set() -> BucketSet<f64> {
        BucketSet::new("price")
            .bucket("under_50", |p: &f64| *p < 50.0)
            .bucket("50_to_100", |p: &f64| (50.0..100.0).contains(p))
            .bucket("100_plus", |p: &f64| *p >= 100.0)
    }

    #[test]
    fn test_partition_columns_and_shares() {
        let prices = vec![10.0, 60.0, 70.0, 150.0];
        let result = aggregate(&prices, |_| (), vec![MetricSpec::partition("pct_", price_set())]);

        let names: Vec<&str> = result.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["pct_under_50", "pct_50_to_100", "pct_100_plus"]);

        let summary = result.summary(&()).unwrap();
        assert_eq!(summary.number("pct_under_50"), Some(25.0));
        assert_eq!(summary.number("pct_50_to_100"), Some(50.0));
        assert_eq!(summary.number("pct_100_plus"), Some(25.0));
    }

    #[test]
    fn test_partition_detects_overlap_and_gap() {
        let overlapping = BucketSet::new("drifted")
            .bucket("low", |p: &f64| *p <= 50.0)
            .bucket("high", |p: &f64| *p >= 50.0);
        let result = aggregate(&[50.0], |_| (), vec![MetricSpec::partition("pct_", overlapping)]);
        assert!(matches!(
            result.summary(&()).unwrap().error(),
            Some(AggregateError::BucketOverlap { .. })
        ));

        let gappy = BucketSet::new("gappy")
            .bucket("low", |p: &f64| *p < 50.0)
            .bucket("high", |p: &f64| *p > 50.0);
        let result = aggregate(&[50.0], |_| (), vec![MetricSpec::partition("pct_", gappy)]);
        assert_eq!(
            result.summary(&()).unwrap().error(),
            Some(&AggregateError::BucketGap {
                set: "gappy".to_string(),
                row: 0
            })
        );
    }

    proptest! {
        #[test]
        fn group_counts_sum_to_input(values in proptest::collection::vec(0u32..1000, 0..200), modulus in 1u32..12) {
            let result = aggregate(&values, move |v: &u32| v % modulus, vec![MetricSpec::count("rows")]);
            let total: u64 = result
                .iter()
                .map(|(_, g)| g.count("rows").unwrap())
                .sum();
            prop_assert_eq!(total as usize, values.len());
            prop_assert_eq!(result.total_rows(), values.len());
        }

        #[test]
        fn exhaustive_bucket_shares_sum_to_100(prices in proptest::collection::vec(0.0f64..500.0, 1..300)) {
            let result = aggregate(&prices, |_| (), vec![MetricSpec::partition("pct_", price_set())]);
            let summary = result.summary(&()).unwrap();
            let total: f64 = summary.values().iter().filter_map(|(_, v)| v.as_f64()).sum();
            prop_assert!((total - 100.0).abs() <= 0.05, "total {}", total);
        }
    }
}
