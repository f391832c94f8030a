//! The report catalog.
//!
//! Each report answers one question about the marketplace from the joined
//! [`Facts`] of a snapshot. Tech membership always comes from the pipeline's
//! single [`SegmentFilter`](crate::segment::SegmentFilter).

use crate::aggregate::{round2, share_pct, Aggregation, Aggregator, BucketSet, MetricSpec};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::join::{Facts, ItemFacts, OrderFacts, ReviewFacts};
use crate::report::{Column, ColumnType, ReportEmitter, ReportTable, Value, YearMonth};
use crate::segment::{PriceBucket, Segment};
use chrono::Datelike;
use marketfit_source::Dataset;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    SegmentOverview,
    MonthlySales,
    YearlySales,
    CategorySummary,
    TopSellers,
    DeliveryPerformance,
    DeliveryByMonth,
    RatingDistribution,
    OrderValue,
    BenchmarkComparison,
}

impl ReportKind {
    pub const ALL: [ReportKind; 10] = [
        ReportKind::SegmentOverview,
        ReportKind::MonthlySales,
        ReportKind::YearlySales,
        ReportKind::CategorySummary,
        ReportKind::TopSellers,
        ReportKind::DeliveryPerformance,
        ReportKind::DeliveryByMonth,
        ReportKind::RatingDistribution,
        ReportKind::OrderValue,
        ReportKind::BenchmarkComparison,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::SegmentOverview => "segment_overview",
            ReportKind::MonthlySales => "monthly_sales",
            ReportKind::YearlySales => "yearly_sales",
            ReportKind::CategorySummary => "category_summary",
            ReportKind::TopSellers => "top_sellers",
            ReportKind::DeliveryPerformance => "delivery_performance",
            ReportKind::DeliveryByMonth => "delivery_by_month",
            ReportKind::RatingDistribution => "rating_distribution",
            ReportKind::OrderValue => "order_value",
            ReportKind::BenchmarkComparison => "benchmark_comparison",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportKind::SegmentOverview => "Items, orders and revenue per segment",
            ReportKind::MonthlySales => "Tech vs. all sales per purchase month",
            ReportKind::YearlySales => "Tech vs. all sales per purchase year",
            ReportKind::CategorySummary => "Price profile of each English category",
            ReportKind::TopSellers => "Sellers ranked by tech items sold",
            ReportKind::DeliveryPerformance => "Delivery speed and lateness per segment",
            ReportKind::DeliveryByMonth => "Delivery lateness per purchase month",
            ReportKind::RatingDistribution => "Review score distribution per segment",
            ReportKind::OrderValue => "Paid order value per segment",
            ReportKind::BenchmarkComparison => "Tech segment against the competitor benchmark",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| PipelineError::UnknownReport {
                name: s.to_string(),
                available: ReportKind::ALL
                    .iter()
                    .map(ReportKind::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// A snapshot joined once and ready to run any report against.
pub struct Pipeline {
    config: PipelineConfig,
    facts: Facts,
}

impl Pipeline {
    pub fn new(dataset: &Dataset, config: PipelineConfig) -> Self {
        let facts = Facts::build(dataset, &config.segment);
        Self { config, facts }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    pub fn run(&self, kind: ReportKind) -> ReportTable {
        let start = Instant::now();
        let facts = &self.facts;

        let table = match kind {
            ReportKind::SegmentOverview => segment_overview(facts),
            ReportKind::MonthlySales => monthly_sales(facts),
            ReportKind::YearlySales => yearly_sales(facts),
            ReportKind::CategorySummary => category_summary(facts),
            ReportKind::TopSellers => top_sellers(facts, self.config.top_sellers),
            ReportKind::DeliveryPerformance => delivery_performance(facts),
            ReportKind::DeliveryByMonth => delivery_by_month(facts),
            ReportKind::RatingDistribution => rating_distribution(facts),
            ReportKind::OrderValue => order_value(facts),
            ReportKind::BenchmarkComparison => benchmark_comparison(facts, &self.config),
        };

        tracing::info!(
            report = kind.name(),
            rows = table.num_rows(),
            has_errors = table.has_errors(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "report complete"
        );

        table
    }

    pub fn run_named(&self, name: &str) -> Result<ReportTable, PipelineError> {
        Ok(self.run(name.parse()?))
    }

    /// Every report in catalog order.
    pub fn run_all(&self) -> Vec<ReportTable> {
        ReportKind::ALL.into_iter().map(|k| self.run(k)).collect()
    }
}

/// Run one report over a snapshot.
pub fn run_report(kind: ReportKind, dataset: &Dataset, config: &PipelineConfig) -> ReportTable {
    Pipeline::new(dataset, config.clone()).run(kind)
}

fn price(item: &ItemFacts) -> Option<f64> {
    Some(item.price)
}

fn item_segments(item: &ItemFacts) -> Vec<Segment> {
    Segment::memberships(item.is_tech).to_vec()
}

fn order_segments(order: &OrderFacts) -> Vec<Segment> {
    Segment::memberships(order.is_tech).to_vec()
}

fn segment_overview(facts: &Facts) -> ReportTable {
    let name = ReportKind::SegmentOverview.name();
    let aggregation = Aggregator::fan_out(item_segments)
        .with_keys(Segment::ALL)
        .metric(MetricSpec::count("items"))
        .metric(MetricSpec::count_distinct("orders", |i: &ItemFacts| {
            Some(i.order_id.clone())
        }))
        .metric(MetricSpec::sum("revenue", price))
        .metric(MetricSpec::avg("avg_price", price))
        .run(&facts.items);

    let mut table = ReportEmitter::new(name, &["segment"]).emit(&aggregation);

    let all_items = aggregation
        .summary(&Segment::AllItems)
        .map_or(0, |s| s.rows());
    let shares = aggregation
        .iter()
        .map(|(_, group)| share_pct(group.rows(), all_items).map_or(Value::Null, Value::Float))
        .collect();
    table.add_column(Column::new("share_of_items_pct", ColumnType::Float), shares);

    table
}

fn sales_metrics<K: Ord + Clone>(aggregator: Aggregator<ItemFacts, K>) -> Aggregator<ItemFacts, K> {
    aggregator
        .metric(MetricSpec::count("all_items"))
        .metric(MetricSpec::count_if("tech_items", |i: &ItemFacts| i.is_tech))
        .metric(MetricSpec::sum("all_revenue", price))
        .metric(MetricSpec::sum("tech_revenue", |i: &ItemFacts| {
            Some(if i.is_tech { i.price } else { 0.0 })
        }))
        .metric(MetricSpec::bucket_share("tech_share_pct", |i: &ItemFacts| i.is_tech))
}

/// Every month between the first and last purchase is listed, including
/// months without sales.
fn monthly_sales(facts: &Facts) -> ReportTable {
    let months: Vec<YearMonth> = facts
        .items
        .iter()
        .filter_map(|i| i.purchased.as_ref())
        .map(YearMonth::of)
        .collect();
    let calendar = match (months.iter().min(), months.iter().max()) {
        (Some(first), Some(last)) => YearMonth::range(*first, *last),
        _ => Vec::new(),
    };

    let aggregation = sales_metrics(Aggregator::fan_out(|i: &ItemFacts| {
        i.purchased.iter().map(YearMonth::of).collect()
    }))
    .with_keys(calendar)
    .run(&facts.items);

    ReportEmitter::new(ReportKind::MonthlySales.name(), &["year", "month"]).emit(&aggregation)
}

fn yearly_sales(facts: &Facts) -> ReportTable {
    let aggregation = sales_metrics(Aggregator::fan_out(|i: &ItemFacts| {
        i.purchased.iter().map(|ts| ts.year()).collect()
    }))
    .run(&facts.items);

    ReportEmitter::new(ReportKind::YearlySales.name(), &["year"]).emit(&aggregation)
}

fn category_summary(facts: &Facts) -> ReportTable {
    let buckets = PriceBucket::ALL
        .into_iter()
        .fold(BucketSet::new("price"), |set, bucket| {
            set.bucket(bucket.label(), move |i: &ItemFacts| bucket.contains(i.price))
        });

    let aggregation = Aggregator::new(|i: &ItemFacts| i.category.clone())
        .metric(MetricSpec::count("items"))
        .metric(MetricSpec::sum("revenue", price))
        .metric(MetricSpec::avg("avg_price", price))
        .metric(MetricSpec::min("min_price", price))
        .metric(MetricSpec::max("max_price", price))
        .metric(MetricSpec::partition("pct_", buckets))
        .run(&facts.items);

    ReportEmitter::new(ReportKind::CategorySummary.name(), &["category"]).emit(&aggregation)
}

fn top_sellers(facts: &Facts, limit: usize) -> ReportTable {
    let aggregation = Aggregator::new(|i: &ItemFacts| i.seller_id.clone())
        .metric(MetricSpec::count("tech_items"))
        .metric(MetricSpec::sum("tech_revenue", price))
        .metric(MetricSpec::avg("avg_price", price))
        .run(facts.items.iter().filter(|i| i.is_tech));

    ReportEmitter::new(ReportKind::TopSellers.name(), &["seller_id"]).emit_ranked(
        &aggregation,
        "tech_items",
        limit,
    )
}

fn delivered(facts: &Facts) -> impl Iterator<Item = &OrderFacts> {
    facts.orders.iter().filter(|o| o.delay_days.is_some())
}

fn days(value: Option<i64>) -> Option<f64> {
    value.map(|d| d as f64)
}

fn delivery_aggregation(facts: &Facts) -> Aggregation<Segment> {
    let timing = BucketSet::new("delivery_timing")
        .bucket("on_time", |o: &OrderFacts| o.delay_days.is_some_and(|d| d <= 0))
        .bucket("late", |o: &OrderFacts| o.delay_days.is_some_and(|d| d > 0));

    Aggregator::fan_out(order_segments)
        .with_keys(Segment::ALL)
        .metric(MetricSpec::count("delivered_orders"))
        .metric(MetricSpec::avg("avg_delivery_days", |o: &OrderFacts| {
            days(o.delivery_days)
        }))
        .metric(MetricSpec::avg("avg_delay_days", |o: &OrderFacts| days(o.delay_days)))
        .metric(MetricSpec::partition("pct_", timing))
        .run(delivered(facts))
}

fn delivery_performance(facts: &Facts) -> ReportTable {
    ReportEmitter::new(ReportKind::DeliveryPerformance.name(), &["segment"])
        .emit(&delivery_aggregation(facts))
}

fn delivery_by_month(facts: &Facts) -> ReportTable {
    let aggregation = Aggregator::new(|o: &OrderFacts| YearMonth::of(&o.purchased))
        .metric(MetricSpec::count("delivered_orders"))
        .metric(MetricSpec::avg("avg_delay_days", |o: &OrderFacts| days(o.delay_days)))
        .metric(MetricSpec::bucket_share("pct_late", |o: &OrderFacts| {
            o.delay_days.is_some_and(|d| d > 0)
        }))
        .run(delivered(facts));

    ReportEmitter::new(ReportKind::DeliveryByMonth.name(), &["year", "month"]).emit(&aggregation)
}

/// Only scored reviews take part; unscored ones are neither 0 nor counted.
fn rating_aggregation(facts: &Facts) -> Aggregation<Segment> {
    let unscored = facts.reviews.iter().filter(|r| r.score.is_none()).count();
    if unscored > 0 {
        tracing::debug!(reviews = unscored, "skipping reviews without a score");
    }

    let aggregator = Aggregator::fan_out(|r: &ReviewFacts| Segment::memberships(r.is_tech).to_vec())
        .with_keys(Segment::ALL)
        .metric(MetricSpec::count("reviews"))
        .metric(MetricSpec::avg("avg_score", |r: &ReviewFacts| r.score.map(f64::from)));

    (1..=5u8)
        .fold(aggregator, |aggregator, score| {
            aggregator.metric(MetricSpec::count_if(
                format!("count_{}", score),
                move |r: &ReviewFacts| r.score == Some(score),
            ))
        })
        .metric(MetricSpec::bucket_share("pct_five_star", |r: &ReviewFacts| {
            r.score == Some(5)
        }))
        .metric(MetricSpec::bucket_share("pct_one_star", |r: &ReviewFacts| {
            r.score == Some(1)
        }))
        .run(facts.reviews.iter().filter(|r| r.score.is_some()))
}

fn rating_distribution(facts: &Facts) -> ReportTable {
    ReportEmitter::new(ReportKind::RatingDistribution.name(), &["segment"])
        .emit(&rating_aggregation(facts))
}

fn order_value(facts: &Facts) -> ReportTable {
    let paid = |o: &OrderFacts| o.paid;
    let aggregation = Aggregator::fan_out(order_segments)
        .with_keys(Segment::ALL)
        .metric(MetricSpec::count("orders"))
        .metric(MetricSpec::sum("total_paid", paid))
        .metric(MetricSpec::avg("avg_order_value", paid))
        .metric(MetricSpec::min("min_order_value", paid))
        .metric(MetricSpec::max("max_order_value", paid))
        .run(facts.orders.iter().filter(|o| o.paid.is_some()));

    ReportEmitter::new(ReportKind::OrderValue.name(), &["segment"]).emit(&aggregation)
}

/// One row per benchmarked figure: tech segment, whole marketplace,
/// competitor, and the tech-minus-competitor gap.
fn benchmark_comparison(facts: &Facts, config: &PipelineConfig) -> ReportTable {
    let delivery = delivery_aggregation(facts);
    let ratings = rating_aggregation(facts);
    let benchmark = config.benchmark.clone().unwrap_or_default();

    if config.benchmark.is_none() {
        tracing::warn!("no competitor benchmark configured; competitor figures are null");
    }

    let figure = |aggregation: &Aggregation<Segment>, segment: Segment, metric: &str| {
        aggregation
            .summary(&segment)
            .and_then(|s| s.number(metric))
            .map(round2)
    };

    let rows = [
        ("avg_delivery_days", &delivery, benchmark.avg_delivery_days),
        ("pct_on_time", &delivery, benchmark.pct_on_time),
        ("avg_score", &ratings, benchmark.avg_score),
        ("pct_five_star", &ratings, benchmark.pct_five_star),
    ];

    let mut table = ReportTable::new(
        ReportKind::BenchmarkComparison.name(),
        vec![
            Column::new("metric", ColumnType::Text),
            Column::new("tech_segment", ColumnType::Float),
            Column::new("all_items", ColumnType::Float),
            Column::new("competitor", ColumnType::Float),
            Column::new("gap", ColumnType::Float),
        ],
    );

    let cell = |v: Option<f64>| v.map_or(Value::Null, Value::Float);
    for (metric, aggregation, competitor) in rows {
        let tech = figure(aggregation, Segment::TechSegment, metric);
        let all = figure(aggregation, Segment::AllItems, metric);
        let gap = tech.zip(competitor).map(|(t, c)| round2(t - c));

        table.push_row(vec![
            Value::Text(metric.to_string()),
            cell(tech),
            cell(all),
            cell(competitor),
            cell(gap),
        ]);
    }

    table
}
