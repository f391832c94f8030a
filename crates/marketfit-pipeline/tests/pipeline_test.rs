//! End-to-end checks of the report catalog over generated snapshots

use marketfit_pipeline::{Pipeline, PipelineConfig, ReportKind, ReportTable, Value};
use marketfit_source::Dataset;
use marketfit_testdata::{presets, DatasetBuilder, DatasetGenerator};

fn snapshot() -> Dataset {
    DatasetGenerator::new(presets::unit_test()).generate()
}

fn int(table: &ReportTable, key: &str, column: &str) -> i64 {
    match table.lookup(key, column) {
        Some(Value::Int(v)) => *v,
        other => panic!("{}.{} for {}: {:?}", table.name, column, key, other),
    }
}

fn float(table: &ReportTable, row: usize, column: &str) -> Option<f64> {
    table.value(row, column).and_then(Value::as_f64)
}

#[test]
fn test_segments_partition_the_items() {
    let dataset = snapshot();
    let table = Pipeline::new(&dataset, PipelineConfig::default()).run(ReportKind::SegmentOverview);

    let all = int(&table, "ALL_ITEMS", "items");
    let tech = int(&table, "TECH_SEGMENT", "items");
    let other = int(&table, "OTHER", "items");

    assert_eq!(all as usize, dataset.order_items.len());
    assert_eq!(all, tech + other);
    assert!(tech > 0, "generated snapshot should contain tech items");
}

#[test]
fn test_monthly_items_add_up() {
    let dataset = snapshot();
    let table = Pipeline::new(&dataset, PipelineConfig::default()).run(ReportKind::MonthlySales);

    // Twelve months of 2018
    assert_eq!(table.num_rows(), 12);
    let total: f64 = (0..table.num_rows())
        .filter_map(|row| float(&table, row, "all_items"))
        .sum();
    assert_eq!(total as usize, dataset.order_items.len());
}

#[test]
fn test_price_bucket_shares_sum_to_100() {
    let table = Pipeline::new(&snapshot(), PipelineConfig::default()).run(ReportKind::CategorySummary);
    assert!(!table.has_errors());

    for row in 0..table.num_rows() {
        let total: f64 = ["pct_under_50", "pct_50_to_100", "pct_100_plus"]
            .iter()
            .filter_map(|c| float(&table, row, c))
            .sum();
        assert!((total - 100.0).abs() <= 0.05, "row {} sums to {}", row, total);
    }
}

#[test]
fn test_untranslated_category_is_kept() {
    let dataset = DatasetGenerator::new(presets::integration_test()).generate();
    let table = Pipeline::new(&dataset, PipelineConfig::default()).run(ReportKind::CategorySummary);

    // Keyed by a null label, sorted first
    assert_eq!(table.rows[0][0], Value::Null);
    let items: f64 = (0..table.num_rows())
        .filter_map(|row| float(&table, row, "items"))
        .sum();
    assert_eq!(items as usize, dataset.order_items.len());
}

#[test]
fn test_delivery_shares_are_complementary() {
    let table =
        Pipeline::new(&snapshot(), PipelineConfig::default()).run(ReportKind::DeliveryPerformance);

    for row in 0..table.num_rows() {
        let on_time = float(&table, row, "pct_on_time").unwrap();
        let late = float(&table, row, "pct_late").unwrap();
        assert!((on_time + late - 100.0).abs() <= 0.05);
    }
}

#[test]
fn test_top_sellers_limit_and_order() {
    let dataset = DatasetGenerator::new(presets::integration_test()).generate();
    let config = PipelineConfig {
        top_sellers: 5,
        ..PipelineConfig::default()
    };
    let table = Pipeline::new(&dataset, config).run(ReportKind::TopSellers);

    assert_eq!(table.num_rows(), 5);
    let counts: Vec<f64> = (0..5).filter_map(|r| float(&table, r, "tech_items")).collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{:?}", counts);
}

#[test]
fn test_segment_definition_comes_from_config() {
    let dataset = snapshot();
    let mut config = PipelineConfig::default();
    config.segment.price_floor = 1_000_000.0;

    let table = Pipeline::new(&dataset, config).run(ReportKind::SegmentOverview);
    assert_eq!(table.lookup("TECH_SEGMENT", "items"), Some(&Value::Int(0)));
    assert_eq!(table.lookup("TECH_SEGMENT", "avg_price"), Some(&Value::Null));
    assert_eq!(table.lookup("ALL_ITEMS", "items"), table.lookup("OTHER", "items"));
    assert!(table.has_errors());
}

#[test]
fn test_reports_are_deterministic() {
    let config = DatasetBuilder::new().seed(7).orders(300).build();
    let a = Pipeline::new(&DatasetGenerator::new(config.clone()).generate(), PipelineConfig::default())
        .run_all();
    let b = Pipeline::new(&DatasetGenerator::new(config).generate(), PipelineConfig::default())
        .run_all();
    assert_eq!(a, b);
}

#[test]
fn test_every_report_converts_to_arrow() {
    let pipeline = Pipeline::new(&snapshot(), PipelineConfig::default());
    for table in pipeline.run_all() {
        let batch = table.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), table.num_rows(), "{}", table.name);
        assert_eq!(batch.num_columns(), table.columns.len(), "{}", table.name);
    }
}
