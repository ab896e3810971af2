//! uidmap CLI
//!
//! Command-line interface for the uidmap console server: submit mapping and
//! tag batches, stop them, and watch their progress and activity log.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "uidmap")]
#[command(about = "Bulk User-ID mapping and tagging console", long_about = None)]
struct Cli {
    /// Console server URL
    #[arg(long, env = "UIDMAP_SERVER_URL", default_value = "http://localhost:8000")]
    server_url: String,

    /// Poll interval in milliseconds for --watch
    #[arg(long, env = "UIDMAP_POLL_MS", default_value_t = 1000)]
    poll_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        poll_interval: Duration::from_millis(cli.poll_ms.max(100)),
    };

    handle_command(cli.command, &config).await
}
