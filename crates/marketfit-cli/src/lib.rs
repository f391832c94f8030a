pub mod config;
pub mod errors;
pub mod runner;

pub use config::{find_project_root, Config, SourceConfig, SourceType, CONFIG_FILE};
pub use errors::CliError;
pub use runner::{export_csv, open_source};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from `RUST_LOG`, defaulting to "info".
///
/// Events go to stderr so report previews on stdout stay clean.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
