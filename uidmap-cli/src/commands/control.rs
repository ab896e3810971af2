//! Job control and observation handlers
//!
//! Stop requests, progress polling, the activity log and the status summary.

use anyhow::Result;
use colored::*;
use uidmap_client::ConsoleClient;
use uidmap_core::domain::job::{JobSnapshot, JobStatus, Progress};
use uidmap_core::dto::job::SubmitResponse;
use uuid::Uuid;

use crate::config::Config;

const BAR_WIDTH: usize = 40;

/// Stop the running job
pub async fn stop(client: &ConsoleClient, job_id: Option<Uuid>) -> Result<()> {
    let ack = client.stop(job_id).await?;
    println!("{}", ack.message.yellow());
    Ok(())
}

/// Halt everything
pub async fn emergency_stop(client: &ConsoleClient) -> Result<()> {
    let ack = client.emergency_stop().await?;
    println!("{} {}", "⛔".red(), ack.message.red().bold());
    Ok(())
}

/// Show progress once, or until the job finishes with `watch`
pub async fn progress(client: &ConsoleClient, config: &Config, watch: bool) -> Result<()> {
    if watch {
        return watch_progress(client, config).await;
    }

    let progress = client.progress().await?;
    println!("{}", render_progress(&progress));
    Ok(())
}

/// Print a submission and optionally follow it to the end
pub async fn report_submitted(
    client: &ConsoleClient,
    config: &Config,
    submitted: &SubmitResponse,
    watch: bool,
) -> Result<()> {
    println!("{} {}", "✓".green(), submitted.message.green());
    println!("  Job ID: {}", submitted.job_id.to_string().cyan());

    if watch {
        watch_progress(client, config).await?;
    }
    Ok(())
}

/// Poll until the job is no longer running, then print its outcome
async fn watch_progress(client: &ConsoleClient, config: &Config) -> Result<()> {
    loop {
        let progress = client.progress().await?;
        println!("{}", render_progress(&progress));
        if !progress.running {
            break;
        }
        tokio::time::sleep(config.poll_interval).await;
    }

    let snapshot = client.job().await?;
    println!("Finished: {}", colorize_status(snapshot.status));
    if let Some(failure) = &snapshot.failure {
        println!("  {}", failure.red());
    }
    Ok(())
}

/// Show the most recent job
pub async fn job(client: &ConsoleClient) -> Result<()> {
    let snapshot = client.job().await?;
    print_job_details(&snapshot);
    Ok(())
}

/// Show the activity log, oldest line first
pub async fn logs(client: &ConsoleClient, limit: usize) -> Result<()> {
    let lines = client.logs(Some(limit)).await?;

    if lines.is_empty() {
        println!("{}", "No activity yet.".yellow());
        return Ok(());
    }

    println!("{}", "─".repeat(80).dimmed());
    for line in &lines {
        println!("{}", colorize_line(line));
    }
    println!("{}", "─".repeat(80).dimmed());
    Ok(())
}

/// Show the server summary
pub async fn status(client: &ConsoleClient) -> Result<()> {
    let status = client.status().await?;

    println!("{}", "Console Status:".bold());
    println!("  Server:   {}", status.status.green());
    println!("  Job:      {}", colorize_status(status.job_status));
    println!(
        "  Agent:    {} {}",
        status.uia_url.cyan(),
        if status.config_verified {
            "(verified)".green()
        } else {
            "(unverified)".yellow()
        }
    );
    Ok(())
}

fn print_job_details(snapshot: &JobSnapshot) {
    let Some(id) = snapshot.job_id else {
        println!("{}", "No job has been submitted yet.".yellow());
        return;
    };

    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", id.to_string().cyan());
    if let Some(kind) = snapshot.kind {
        println!("  Kind:      {}", kind);
    }
    println!("  Status:    {}", colorize_status(snapshot.status));
    println!("  Progress:  {}/{}", snapshot.current, snapshot.total);

    if let Some(created) = snapshot.created_at {
        println!("  Created:   {}", created.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = snapshot.completed_at {
        println!("  Finished:  {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(created) = snapshot.created_at {
            let seconds = completed.signed_duration_since(created).num_seconds();
            println!("  Duration:  {}s", seconds);
        }
    }

    if let Some(failure) = &snapshot.failure {
        println!("\n{}", "Failure:".bold());
        println!("{}", failure.red());
    }
}

/// `[#####.....] 50/100 (50%) running`
fn render_progress(progress: &Progress) -> String {
    let ratio = if progress.total == 0 {
        0.0
    } else {
        progress.current as f64 / progress.total as f64
    };
    let filled = ((ratio * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);

    format!(
        "[{}{}] {}/{} ({:.0}%) {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress.current,
        progress.total,
        ratio * 100.0,
        if progress.running { "running" } else { "idle" }
    )
}

/// Colors a rendered log line by its `[LEVEL]` marker
fn colorize_line(line: &str) -> ColoredString {
    if line.contains("[ERROR]") {
        line.red()
    } else if line.contains("[WARNING]") {
        line.yellow()
    } else if line.contains("[SUCCESS]") {
        line.green()
    } else {
        line.normal()
    }
}

fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        JobStatus::Idle => status_str.dimmed(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Stopping => status_str.yellow(),
        JobStatus::Stopped => status_str.yellow(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_progress() {
        let half = Progress {
            current: 50,
            total: 100,
            running: true,
        };
        let rendered = render_progress(&half);
        assert!(rendered.starts_with(&format!("[{}{}]", "#".repeat(20), ".".repeat(20))));
        assert!(rendered.ends_with("50/100 (50%) running"));
    }

    #[test]
    fn test_render_progress_empty() {
        let rendered = render_progress(&Progress::default());
        assert!(rendered.ends_with("0/0 (0%) idle"));
    }
}
