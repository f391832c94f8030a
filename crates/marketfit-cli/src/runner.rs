//! Opening the configured source and exporting report tables.

use crate::config::{SourceConfig, SourceType};
use crate::errors::CliError;
use anyhow::{Context, Result};
use arrow::csv::Writer;
use marketfit_pipeline::ReportTable;
use marketfit_source::DataSource;
use marketfit_source_duckdb::DuckDbSource;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Open the data source described by `source`.
///
/// `data_override` replaces the configured path; a directory is read as CSV
/// files and anything else as a DuckDB database.
pub async fn open_source(
    source: &SourceConfig,
    project_dir: &Path,
    data_override: Option<&Path>,
) -> Result<Box<dyn DataSource>> {
    let (path, source_type) = match data_override {
        Some(path) if path.is_dir() => (path.to_path_buf(), SourceType::Csv),
        Some(path) => (path.to_path_buf(), SourceType::DuckDb),
        None => (project_dir.join(&source.path), source.source_type),
    };

    if !path.exists() {
        return Err(CliError::SourceNotFound { path }.into());
    }

    let data_source: Box<dyn DataSource> = match source_type {
        SourceType::Csv => {
            let files = source.csv_files(&path)?;
            Box::new(
                DuckDbSource::from_csv_files(files)
                    .await
                    .with_context(|| format!("Failed to register CSV files in {:?}", path))?,
            )
        }
        SourceType::DuckDb => Box::new(
            DuckDbSource::open(&path, &source.schema)
                .await
                .with_context(|| format!("Failed to open DuckDB database at {:?}", path))?,
        ),
    };

    tracing::debug!(path = %path.display(), kind = data_source.kind().name(), "opened source");

    Ok(data_source)
}

/// Write `table` to `<out_dir>/<report name>.csv` and return the file path.
pub fn export_csv(table: &ReportTable, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}.csv", table.name));
    let export_error = |source: anyhow::Error| CliError::ExportError {
        report: table.name.clone(),
        path: path.clone(),
        source,
    };

    fs::create_dir_all(out_dir).map_err(|e| export_error(e.into()))?;
    let batch = table.to_record_batch().map_err(|e| export_error(e.into()))?;

    let file = File::create(&path).map_err(|e| export_error(e.into()))?;
    let mut writer = Writer::new(file);
    writer.write(&batch).map_err(|e| export_error(e.into()))?;

    Ok(path)
}
