use crate::errors::CliError;
use anyhow::Result;
use marketfit_pipeline::{PipelineConfig, ReportKind};
use marketfit_source::Relation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "marketfit.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Csv,
    DuckDb,
}

impl<'de> Deserialize<'de> for SourceType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "csv" => Ok(SourceType::Csv),
            "duckdb" => Ok(SourceType::DuckDb),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid source type: {}. Must be 'csv' or 'duckdb'",
                s
            ))),
        }
    }
}

impl Serialize for SourceType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            SourceType::Csv => serializer.serialize_str("csv"),
            SourceType::DuckDb => serializer.serialize_str("duckdb"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub name: String,
    pub source: SourceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Reports to run; empty runs the whole catalog
    #[serde(default)]
    pub reports: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_schema() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// CSV directory or DuckDB file, relative to the project root
    pub path: String,
    // DuckDB fields
    #[serde(default = "default_schema")]
    pub schema: String,
    // CSV fields: relation table name -> file name, for exports that were renamed
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, String>,
}

impl SourceConfig {
    /// CSV file per relation, applying `files` overrides to the default names.
    pub fn csv_files(&self, dir: &Path) -> Result<Vec<(Relation, PathBuf)>> {
        for name in self.files.keys() {
            name.parse::<Relation>().map_err(|_| CliError::UnknownRelation {
                name: name.clone(),
                known: Relation::ALL
                    .iter()
                    .map(|r| r.table_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        }

        Ok(Relation::ALL
            .into_iter()
            .map(|relation| {
                let file = self
                    .files
                    .get(relation.table_name())
                    .map(String::as_str)
                    .unwrap_or(relation.default_csv_file());
                (relation, dir.join(file))
            })
            .collect())
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content =
            std::fs::read_to_string(&config_path).map_err(|e| CliError::ConfigLoadError {
                path: config_path.clone(),
                source: e.into(),
            })?;

        serde_yaml::from_str(&content).map_err(|e| {
            CliError::ConfigLoadError {
                path: config_path,
                source: e.into(),
            }
            .into()
        })
    }

    /// Reports to run: `requested` if non-empty, else the configured list,
    /// else the whole catalog.
    pub fn selected_reports(&self, requested: &[String]) -> Result<Vec<ReportKind>> {
        let names: &[String] = if requested.is_empty() {
            &self.reports
        } else {
            requested
        };

        if names.is_empty() {
            return Ok(ReportKind::ALL.to_vec());
        }

        names
            .iter()
            .map(|name| name.parse::<ReportKind>().map_err(Into::into))
            .collect()
    }
}

/// Find the project root by looking for marketfit.yml
pub fn find_project_root(start_dir: &Path) -> Result<PathBuf> {
    let mut current = start_dir.to_path_buf();

    // Walk up max 5 levels
    for _ in 0..5 {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    Err(CliError::ProjectRootNotFound.into())
}
