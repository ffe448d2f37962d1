use anyhow::Result;
use clap::Parser;
use pocketbook::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("pocketbook={level},sqlx=warn"))),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.run().await
}
