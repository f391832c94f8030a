use anyhow::{Context, Result};
use arrow::util::pretty;
use clap::{Parser, Subcommand};
use marketfit_cli::{export_csv, find_project_root, init_tracing, open_source, Config};
use marketfit_pipeline::{Pipeline, ReportKind};
use marketfit_source::DataSource;
use marketfit_testdata::{CsvOutput, DatasetBuilder, DatasetGenerator};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "marketfit")]
#[command(about = "Marketplace fit reports for a premium tech product line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the snapshot, run reports and write one CSV per report
    Run(RunArgs),
    /// List the available reports
    Reports,
    /// Write a synthetic snapshot as CSV files
    Generate(GenerateArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Path to marketfit project root
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// CSV directory or DuckDB file, overriding the configured source
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output directory, overriding output_dir from marketfit.yml
    #[arg(long)]
    out: Option<PathBuf>,

    /// Run only this report (repeatable)
    #[arg(long = "report")]
    reports: Vec<String>,

    /// Print each report table after it is computed
    #[arg(long)]
    show_results: bool,

    /// Load and validate without running reports
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser)]
struct GenerateArgs {
    /// Directory to write the CSV files into
    #[arg(long)]
    out: PathBuf,

    /// Master seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of orders
    #[arg(long, default_value_t = 5_000)]
    orders: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Reports => {
            list_reports();
            Ok(())
        }
        Commands::Generate(args) => generate(args),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    // 1. Find project root
    let project_dir = find_project_root(&args.project_dir)
        .with_context(|| format!("Failed to find project root from {:?}", args.project_dir))?;

    println!("Project directory: {}", project_dir.display());

    // 2. Load configuration
    let config = Config::load(&project_dir)
        .with_context(|| "Failed to load marketfit.yml configuration")?;

    println!("Project: {}", config.name);

    let selected = config
        .selected_reports(&args.reports)
        .with_context(|| "Invalid report selection")?;

    println!(
        "Reports: {}",
        selected
            .iter()
            .map(ReportKind::name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    // 3. Load the snapshot
    let source = open_source(&config.source, &project_dir, args.data.as_deref()).await?;
    let dataset = source
        .load_dataset()
        .await
        .with_context(|| "Failed to load dataset")?;

    println!("Loaded {}", dataset.summary());

    if args.dry_run {
        println!("\n[DRY RUN] Skipping reports");
        return Ok(());
    }

    // 4. Run reports
    let out_dir = args
        .out
        .unwrap_or_else(|| project_dir.join(&config.output_dir));
    let pipeline = Pipeline::new(&dataset, config.pipeline.clone());

    println!("\n{}", "=".repeat(60));
    println!("Running reports...");
    println!("{}", "=".repeat(60));

    let started = Instant::now();
    let mut reports_with_errors = 0;

    for kind in &selected {
        let report_start = Instant::now();
        let table = pipeline.run(*kind);
        let path = export_csv(&table, &out_dir)?;

        let marker = if table.has_errors() {
            reports_with_errors += 1;
            "!"
        } else {
            "✓"
        };
        println!(
            "  {} {} ({} rows, {:?}) -> {}",
            marker,
            kind.name(),
            table.num_rows(),
            report_start.elapsed(),
            path.display()
        );

        if args.show_results {
            let batch = table.to_record_batch()?;
            pretty::print_batches(&[batch]).with_context(|| "Failed to print report preview")?;
            println!();
        }
    }

    // 5. Summary
    println!("\n{}", "=".repeat(60));
    println!("Summary");
    println!("{}", "=".repeat(60));
    println!("✓ Wrote {} reports to {}", selected.len(), out_dir.display());
    if reports_with_errors > 0 {
        println!(
            "  {} report(s) contain groups with errors (see the 'error' column)",
            reports_with_errors
        );
    }
    println!("  Total time: {:?}", started.elapsed());

    Ok(())
}

fn list_reports() {
    for kind in ReportKind::ALL {
        println!("{:<22} {}", kind.name(), kind.description());
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let config = DatasetBuilder::new()
        .seed(args.seed)
        .orders(args.orders)
        .build();
    let dataset = DatasetGenerator::new(config).generate();

    let rows = CsvOutput::new()
        .write_dataset(&args.out, &dataset)
        .with_context(|| format!("Failed to write dataset to {:?}", args.out))?;

    println!("Generated {}", dataset.summary());
    println!("✓ Wrote {} rows to {}", rows, args.out.display());

    Ok(())
}
