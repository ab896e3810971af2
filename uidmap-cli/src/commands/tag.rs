//! Tag command handlers
//!
//! Targets come from the command line and/or a file; either may hold several
//! entries separated by commas or newlines.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;
use uidmap_client::ConsoleClient;
use uidmap_core::domain::work_item::{AddressTagAction, UserTagAction};
use uidmap_core::dto::tag::{IpTagItem, IpTagRequest, UserTagItem, UserTagRequest};

use super::control::report_submitted;
use crate::config::Config;

#[derive(Clone, Copy, ValueEnum)]
pub enum TagAction {
    Register,
    Unregister,
}

#[derive(Args)]
pub struct TagArgs {
    /// register or unregister
    #[arg(value_enum)]
    action: TagAction,

    /// Tag applied to every target
    #[arg(long)]
    tag: String,

    /// Targets, comma separated
    targets: Vec<String>,

    /// File with additional targets
    #[arg(long)]
    file: Option<PathBuf>,

    /// Agent the batch is meant for (must be the verified one)
    #[arg(long)]
    uia_url: Option<String>,

    /// Follow the job until it finishes
    #[arg(short, long)]
    watch: bool,
}

/// Tag subcommands
#[derive(Subcommand)]
pub enum TagCommands {
    /// Tag IP addresses (dynamic address groups)
    Ip(TagArgs),
    /// Tag users (dynamic user groups)
    User(TagArgs),
}

/// Handle tag commands
pub async fn handle_tag_command(
    command: TagCommands,
    client: &ConsoleClient,
    config: &Config,
) -> Result<()> {
    match command {
        TagCommands::Ip(args) => {
            let targets = collect_targets(&args)?;
            let req = IpTagRequest {
                items: targets
                    .into_iter()
                    .map(|ip| IpTagItem {
                        ip,
                        tag: args.tag.clone(),
                    })
                    .collect(),
                action: match args.action {
                    TagAction::Register => AddressTagAction::Register,
                    TagAction::Unregister => AddressTagAction::Unregister,
                },
                uia_url: args.uia_url.clone(),
            };
            req.work_items()?;

            let submitted = client.update_ip_tags(&req).await?;
            report_submitted(client, config, &submitted, args.watch).await
        }
        TagCommands::User(args) => {
            let targets = collect_targets(&args)?;
            let req = UserTagRequest {
                items: targets
                    .into_iter()
                    .map(|user| UserTagItem {
                        user,
                        tag: args.tag.clone(),
                    })
                    .collect(),
                action: match args.action {
                    TagAction::Register => UserTagAction::RegisterUser,
                    TagAction::Unregister => UserTagAction::UnregisterUser,
                },
                uia_url: args.uia_url.clone(),
            };
            req.work_items()?;

            let submitted = client.update_user_tags(&req).await?;
            report_submitted(client, config, &submitted, args.watch).await
        }
    }
}

fn collect_targets(args: &TagArgs) -> Result<Vec<String>> {
    let mut targets: Vec<String> = args.targets.iter().flat_map(|t| split_targets(t)).collect();

    if let Some(path) = &args.file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        targets.extend(split_targets(&contents));
    }

    if targets.is_empty() {
        bail!("no targets given; pass them as arguments or with --file");
    }
    Ok(targets)
}

/// Splits on commas and newlines, dropping blanks
fn split_targets(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_targets() {
        assert_eq!(
            split_targets("10.0.0.1, 10.0.0.2\n\n10.0.0.3,\r\n"),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
        assert!(split_targets(" ,\n ").is_empty());
    }

    #[test]
    fn test_collect_targets_requires_some() {
        let args = TagArgs {
            action: TagAction::Register,
            tag: "vip".to_string(),
            targets: vec![],
            file: None,
            uia_url: None,
            watch: false,
        };
        assert!(collect_targets(&args).is_err());
    }

    #[test]
    fn test_collect_targets_reads_file() {
        let path = std::env::temp_dir().join(format!("uidmap-targets-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "corp\\bob\ncorp\\eve\n").unwrap();

        let args = TagArgs {
            action: TagAction::Unregister,
            tag: "vip".to_string(),
            targets: vec!["corp\\alice".to_string()],
            file: Some(path.clone()),
            uia_url: None,
            watch: false,
        };
        assert_eq!(
            collect_targets(&args).unwrap(),
            vec!["corp\\alice", "corp\\bob", "corp\\eve"]
        );
        std::fs::remove_file(path).unwrap();
    }
}
