//! Connection command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use uidmap_client::ConsoleClient;

/// Connection subcommands
#[derive(Subcommand)]
pub enum ConnectionCommands {
    /// Verify an agent endpoint and make it the active one
    Test {
        /// Agent endpoint as host:port
        uia_url: String,

        /// Save the endpoint without probing it
        #[arg(long)]
        force: bool,
    },
    /// Show which certificate files the server has
    Certs,
}

/// Handle connection commands
pub async fn handle_connection_command(
    command: ConnectionCommands,
    client: &ConsoleClient,
) -> Result<()> {
    match command {
        ConnectionCommands::Test { uia_url, force } => {
            let ack = client.test_connection(&uia_url, force).await?;
            if force {
                println!("{} {}", "⚠".yellow(), ack.message.yellow());
            } else {
                println!("{} {}", "✓".green(), ack.message.green());
            }
            Ok(())
        }
        ConnectionCommands::Certs => {
            let status = client.cert_status().await?;
            println!("{}", format!("Certificates in {}:", status.cert_dir).bold());
            println!("  Root CA:        {}", mark(status.has_ca));
            println!("  Client cert:    {}", mark(status.has_client));
            println!("  Server bundle:  {}", mark(status.has_server));
            if !status.has_certs {
                println!(
                    "{}",
                    "Client TLS material is incomplete; agent calls will fail.".yellow()
                );
            }
            Ok(())
        }
    }
}

fn mark(present: bool) -> ColoredString {
    if present { "✓".green() } else { "✗".red() }
}
