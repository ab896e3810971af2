//! Mapping command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use uidmap_client::ConsoleClient;
use uidmap_core::domain::work_item::MappingOperation;
use uidmap_core::dto::mapping::{
    BulkMappingRequest, DEFAULT_BASE_IP, DEFAULT_TIMEOUT, DEFAULT_USER_PREFIX,
    SingleMappingRequest, SubnetMappingRequest,
};

use super::control::report_submitted;
use crate::config::Config;

/// Mapping subcommands
#[derive(Subcommand)]
pub enum MapCommands {
    /// Send one mapping immediately
    Single {
        /// IP address
        #[arg(long)]
        ip: String,

        /// User name, e.g. corp\alice
        #[arg(long)]
        username: String,

        /// Mapping timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT)]
        timeout: u32,

        /// Remove the mapping instead of creating it
        #[arg(long)]
        logout: bool,

        /// Agent the mapping is meant for (must be the verified one)
        #[arg(long)]
        uia_url: Option<String>,
    },
    /// Map `count` consecutive addresses to numbered users
    Bulk {
        /// Number of mappings
        #[arg(long)]
        count: usize,

        /// Prefix of generated user names
        #[arg(long, default_value = DEFAULT_USER_PREFIX)]
        user_prefix: String,

        /// First address of the range
        #[arg(long, default_value = DEFAULT_BASE_IP)]
        base_ip: String,

        /// Mapping timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT)]
        timeout: u32,

        /// Remove the mappings instead of creating them
        #[arg(long)]
        logout: bool,

        /// Agent the batch is meant for (must be the verified one)
        #[arg(long)]
        uia_url: Option<String>,

        /// Follow the job until it finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Map every host address of a subnet to numbered users
    Subnet {
        /// Subnet in CIDR notation, e.g. 10.20.0.0/24
        #[arg(long)]
        subnet: String,

        /// Prefix of generated user names
        #[arg(long, default_value = DEFAULT_USER_PREFIX)]
        user_prefix: String,

        /// Mapping timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT)]
        timeout: u32,

        /// Remove the mappings instead of creating them
        #[arg(long)]
        logout: bool,

        /// Agent the batch is meant for (must be the verified one)
        #[arg(long)]
        uia_url: Option<String>,

        /// Follow the job until it finishes
        #[arg(short, long)]
        watch: bool,
    },
}

/// Handle mapping commands
pub async fn handle_map_command(
    command: MapCommands,
    client: &ConsoleClient,
    config: &Config,
) -> Result<()> {
    match command {
        MapCommands::Single {
            ip,
            username,
            timeout,
            logout,
            uia_url,
        } => {
            let req = SingleMappingRequest {
                ip,
                username,
                timeout,
                operation: operation(logout),
                uia_url,
            };
            let ack = client.single_mapping(&req).await?;
            println!("{} {}", "✓".green(), ack.message.green());
            Ok(())
        }
        MapCommands::Bulk {
            count,
            user_prefix,
            base_ip,
            timeout,
            logout,
            uia_url,
            watch,
        } => {
            let req = BulkMappingRequest {
                count,
                user_prefix,
                base_ip,
                timeout,
                operation: operation(logout),
                uia_url,
            };
            // Catch malformed ranges before they reach the server.
            req.work_items()?;

            let submitted = client.bulk_mapping(&req).await?;
            report_submitted(client, config, &submitted, watch).await
        }
        MapCommands::Subnet {
            subnet,
            user_prefix,
            timeout,
            logout,
            uia_url,
            watch,
        } => {
            let req = SubnetMappingRequest {
                subnet,
                user_prefix,
                timeout,
                operation: operation(logout),
                uia_url,
            };
            let hosts = req.host_count()?;
            println!("Subnet {} has {} host(s)", req.subnet.cyan(), hosts);

            let submitted = client.map_subnet(&req).await?;
            report_submitted(client, config, &submitted, watch).await
        }
    }
}

fn operation(logout: bool) -> MappingOperation {
    if logout {
        MappingOperation::Logout
    } else {
        MappingOperation::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: MapCommands,
    }

    #[test]
    fn test_subnet_command_defaults() {
        let cli = Cli::try_parse_from(["map", "subnet", "--subnet", "10.20.0.0/24", "--logout"]).unwrap();
        let MapCommands::Subnet {
            subnet,
            user_prefix,
            timeout,
            logout,
            uia_url,
            watch,
        } = cli.command
        else {
            panic!("expected the subnet command");
        };
        assert_eq!(subnet, "10.20.0.0/24");
        assert_eq!(user_prefix, DEFAULT_USER_PREFIX);
        assert_eq!(timeout, DEFAULT_TIMEOUT);
        assert!(logout);
        assert!(uia_url.is_none());
        assert!(!watch);
    }

    #[test]
    fn test_subnet_command_requires_subnet() {
        assert!(Cli::try_parse_from(["map", "subnet"]).is_err());
    }
}
