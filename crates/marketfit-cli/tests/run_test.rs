//! Integration test: generated CSV snapshot -> configured reports -> CSV exports

use marketfit_cli::{export_csv, find_project_root, open_source, Config};
use marketfit_pipeline::{Pipeline, ReportKind};
use marketfit_source::{DataSource, SourceKind};
use marketfit_testdata::{CsvOutput, DatasetBuilder, DatasetGenerator};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write a synthetic snapshot under `<project>/data` and a marketfit.yml next to it.
fn seed_project(project_dir: &Path, config: &str) -> anyhow::Result<usize> {
    let dataset = DatasetGenerator::new(DatasetBuilder::new().seed(11).orders(300).build()).generate();
    CsvOutput::new().write_dataset(&project_dir.join("data"), &dataset)?;
    fs::write(project_dir.join("marketfit.yml"), config)?;
    Ok(dataset.order_items.len())
}

const CONFIG: &str = r#"
name: marketfit-test
source:
  type: csv
  path: data
pipeline:
  top_sellers: 3
  benchmark:
    name: competitor
    avg_delivery_days: 3
    pct_on_time: 95
reports: [segment_overview, top_sellers, benchmark_comparison]
output_dir: out
"#;

#[tokio::test]
async fn test_run_configured_reports() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let project_dir = temp_dir.path();
    let items = seed_project(project_dir, CONFIG)?;

    let nested = project_dir.join("data");
    assert_eq!(find_project_root(&nested)?, project_dir);

    let config = Config::load(project_dir)?;
    let source = open_source(&config.source, project_dir, None).await?;
    assert_eq!(source.kind(), SourceKind::Csv);

    let dataset = source.load_dataset().await?;
    assert_eq!(dataset.order_items.len(), items);

    let pipeline = Pipeline::new(&dataset, config.pipeline.clone());
    let out_dir = project_dir.join(&config.output_dir);
    let selected = config.selected_reports(&[])?;
    assert_eq!(selected.len(), 3);

    for kind in &selected {
        export_csv(&pipeline.run(*kind), &out_dir)?;
    }

    let overview = fs::read_to_string(out_dir.join("segment_overview.csv"))?;
    assert!(overview.starts_with("segment,items,orders,revenue,avg_price,share_of_items_pct"));
    assert!(overview.contains(&format!("ALL_ITEMS,{},", items)));

    let sellers = fs::read_to_string(out_dir.join("top_sellers.csv"))?;
    assert_eq!(sellers.lines().count(), 4);

    let benchmark = fs::read_to_string(out_dir.join("benchmark_comparison.csv"))?;
    let on_time = benchmark
        .lines()
        .find(|l| l.starts_with("pct_on_time,"))
        .expect("pct_on_time row");
    assert!(on_time.contains(",95"), "{}", on_time);

    Ok(())
}

#[tokio::test]
async fn test_missing_relation_aborts_load() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let project_dir = temp_dir.path();
    seed_project(project_dir, CONFIG)?;
    fs::remove_file(project_dir.join("data").join("olist_order_payments_dataset.csv"))?;

    let config = Config::load(project_dir)?;
    let source = open_source(&config.source, project_dir, None).await?;
    let err = source.load_dataset().await.unwrap_err();

    assert!(err.is_data_unavailable());
    assert!(err.to_string().contains("order_payments"), "{}", err);
    Ok(())
}

#[tokio::test]
async fn test_data_override_and_report_flag() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let project_dir = temp_dir.path();
    seed_project(project_dir, CONFIG)?;

    // Move the CSVs somewhere the config does not point to
    let elsewhere = project_dir.join("elsewhere");
    fs::rename(project_dir.join("data"), &elsewhere)?;

    let config = Config::load(project_dir)?;
    let source = open_source(&config.source, project_dir, Some(&elsewhere)).await?;
    let dataset = source.load_dataset().await?;

    let selected = config.selected_reports(&["rating_distribution".to_string()])?;
    assert_eq!(selected, vec![ReportKind::RatingDistribution]);

    let table = Pipeline::new(&dataset, config.pipeline).run(selected[0]);
    assert_eq!(table.num_rows(), 3);
    Ok(())
}
