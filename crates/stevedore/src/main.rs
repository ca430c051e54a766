//! Stevedore CLI binary.

use anyhow::Result;
use stevedore::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the stevedore CLI.
///
/// Uses tokio's current_thread runtime; the only I/O is reading two small files.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON and DOT output stay clean.
    // Example: RUST_LOG=stevedore=debug stevedore graph
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stevedore=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting stevedore CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Stevedore CLI completed successfully");
    Ok(())
}
