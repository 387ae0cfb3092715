mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use topicforge::config::{Config, TelemetryConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = Config::load_with(cli.config.clone())?;
    if let Some(base_url) = cli.base_url.clone() {
        config.client.base_url = base_url;
        config.validate()?;
    }

    init_tracing(&config.telemetry);

    commands::run(cli.command, config).await
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(telemetry: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
