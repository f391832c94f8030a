use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Could not find marketfit project root.\nExpected to find 'marketfit.yml' in the directory or one of its parents.")]
    ProjectRootNotFound,

    #[error("Failed to load configuration file: {path}\n{source}")]
    ConfigLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Unknown relation '{name}' in source.files. Known relations: {known}")]
    UnknownRelation { name: String, known: String },

    #[error("Source data not found: {path}\n\nHint: Run 'marketfit generate --out {path}' to create a synthetic dataset")]
    SourceNotFound { path: PathBuf },

    #[error("Failed to export report '{report}' to {path}:\n  {source}")]
    ExportError {
        report: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
