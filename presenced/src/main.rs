//! Presence lighting daemon: camera motion events in, light switching out.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use isapi_stream::{StreamClient, StreamSupervisor};
use presence_engine::PresenceEngine;

mod config;
mod conversion;

use config::Config;

/// Turn lights on when a camera sees motion, back off when it stops.
#[derive(Parser, Debug)]
#[command(name = "presenced")]
#[command(about = "Presence lighting driven by camera motion events")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "presenced.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let credentials = config.resolve_credentials()?;

    let driver = Arc::new(conversion::build_driver(&config).context("invalid light topology")?);
    let engine = Arc::new(
        PresenceEngine::new(driver, conversion::presence_groups(&config))
            .context("invalid presence mapping")?,
    );
    info!(
        "presence mapping ready: {} channels, {} lights",
        engine.mapping().channel_count(),
        engine.mapping().light_names().len()
    );

    let source = Arc::new(
        StreamClient::new(credentials.url, credentials.username, credentials.password)
            .context("could not build the stream client")?,
    );
    let supervisor =
        StreamSupervisor::new(source, engine).with_max_retries(config.stream.max_retries);

    // Blocks for the lifetime of the stream; returns only when the retry
    // budget is exhausted, which is a terminal condition for the daemon.
    supervisor.run().await?;
    Ok(())
}
