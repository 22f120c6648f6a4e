use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::prelude::*;

use feed_client::ClientConfig;

mod commands;

use commands::Cli;

fn init_tracing(log_format: &str) {
    let json = log_format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,feed_client=debug".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
        }))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Failed to load FEED_CLIENT_* configuration")?;
    init_tracing(&config.log_format);

    debug!(api = %config.api_base_url, "Running command");
    commands::run(cli.command, &config).await
}
