use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use upwatch::{Config, Service};

/// Periodically probes stored HTTP checks and alerts owners on state changes
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the config file (defaults to $XDG_CONFIG_HOME/upwatch/config.toml)
    #[arg(short, long, env = "UPWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_config(cli.config.as_ref())?;
    logger::init(&config.logging);
    info!("{}", config);

    let service = Service::from_config(&config)?;
    let handle = service.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown();

    Ok(())
}
