//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod connection;
mod control;
mod mapping;
mod tag;

pub use connection::ConnectionCommands;
pub use mapping::MapCommands;
pub use tag::TagCommands;

use anyhow::Result;
use clap::Subcommand;
use uidmap_client::ConsoleClient;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// User/address mappings
    Map {
        #[command(subcommand)]
        command: MapCommands,
    },
    /// Address and user tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Stop the running job after its current item
    Stop {
        /// Only stop if this job is the running one
        #[arg(long)]
        job_id: Option<Uuid>,
    },
    /// Halt every job and in-flight operation
    EmergencyStop,
    /// Show job progress
    Progress {
        /// Keep polling until the job finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show details of the most recent job
    Job,
    /// Show the activity log
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },
    /// Show server, job and connection status
    Status,
    /// Agent connection management
    Connection {
        #[command(subcommand)]
        command: ConnectionCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = ConsoleClient::new(&config.server_url);

    match command {
        Commands::Map { command } => mapping::handle_map_command(command, &client, config).await,
        Commands::Tag { command } => tag::handle_tag_command(command, &client, config).await,
        Commands::Stop { job_id } => control::stop(&client, job_id).await,
        Commands::EmergencyStop => control::emergency_stop(&client).await,
        Commands::Progress { watch } => control::progress(&client, config, watch).await,
        Commands::Job => control::job(&client).await,
        Commands::Logs { limit } => control::logs(&client, limit).await,
        Commands::Status => control::status(&client).await,
        Commands::Connection { command } => {
            connection::handle_connection_command(command, &client).await
        }
    }
}
