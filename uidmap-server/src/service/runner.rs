//! Job runner
//!
//! Drives a job's items through the agent one at a time, in submission
//! order. After every item it publishes progress and an activity log line;
//! before every item it checks the job's cancellation token and re-reads the
//! connection config.
//!
//! Per-item failures are best-effort: the item counts as processed, an ERROR
//! line names it, and the batch moves on. Only systemic failures (a run of
//! unreachable replies, unusable client material, a connection that lost its
//! verification) end the job early as Failed.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uidmap_core::domain::connection::ConnectionConfig;
use uidmap_core::domain::job::{Job, JobStatus};
use uidmap_core::domain::work_item::WorkItem;

use crate::agent::{AgentAck, AgentClient, AgentError};
use crate::config::ServerConfig;
use crate::service::connection::{ConnectionError, ConnectionStore};
use crate::service::log_sink::LogSink;
use crate::service::progress::ProgressTracker;

/// Tunables of the item loop
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub agent_timeout: Duration,
    pub unreachable_threshold: u32,
    pub throttle_every: usize,
    pub throttle_pause: Duration,
}

impl From<&ServerConfig> for RunnerSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            agent_timeout: config.agent_timeout,
            unreachable_threshold: config.unreachable_threshold,
            throttle_every: config.throttle_every,
            throttle_pause: config.throttle_pause,
        }
    }
}

/// Failure of a one-off operation run outside the job registry
#[derive(Debug, Error)]
pub enum SingleOpError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("operation halted by emergency stop")]
    Halted,

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// How the item loop ended
#[derive(Debug)]
enum Outcome {
    Completed { failed: usize },
    Stopped { processed: usize },
    Failed { reason: String },
}

pub struct JobRunner {
    agent: Arc<dyn AgentClient>,
    connection: Arc<ConnectionStore>,
    logs: Arc<dyn LogSink>,
    tracker: Arc<ProgressTracker>,
    settings: RunnerSettings,
}

impl JobRunner {
    pub fn new(
        agent: Arc<dyn AgentClient>,
        connection: Arc<ConnectionStore>,
        logs: Arc<dyn LogSink>,
        tracker: Arc<ProgressTracker>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            agent,
            connection,
            logs,
            tracker,
            settings,
        }
    }

    /// Runs an admitted job to a terminal status
    ///
    /// The job must already be Running in the tracker.
    pub async fn run(&self, job: Job, cancel: CancellationToken) -> JobStatus {
        info!("Starting {} job {} ({} items)", job.kind, job.id, job.total());
        self.logs.info(format!(
            "Starting {} job: {} item(s)",
            job.kind,
            job.total()
        ));

        let (status, failure) = match self.process(&job, &cancel).await {
            Outcome::Completed { failed } => {
                self.logs.info(format!(
                    "{} job completed: {} of {} item(s) succeeded",
                    job.kind,
                    job.total() - failed,
                    job.total()
                ));
                (JobStatus::Completed, None)
            }
            Outcome::Stopped { processed } => {
                self.logs.warning(format!(
                    "{} job stopped after {} of {} item(s)",
                    job.kind,
                    processed,
                    job.total()
                ));
                (JobStatus::Stopped, None)
            }
            Outcome::Failed { reason } => {
                self.logs.error(format!("{} job failed: {}", job.kind, reason));
                (JobStatus::Failed, Some(reason))
            }
        };

        self.tracker.finish(job.id, status, failure);
        info!("Job {} finished with status {}", job.id, status);
        status
    }

    async fn process(&self, job: &Job, cancel: &CancellationToken) -> Outcome {
        let total = job.total();
        let mut failed = 0;
        let mut unreachable_streak = 0u32;

        for (index, item) in job.items.iter().enumerate() {
            if cancel.is_cancelled() {
                return Outcome::Stopped { processed: index };
            }

            let connection = self.connection.current();
            if !connection.verified {
                return Outcome::Failed {
                    reason: format!(
                        "connection to {} is no longer verified",
                        connection.endpoint
                    ),
                };
            }

            let result = self.call_agent(&connection, item).await;
            let current = self.tracker.advance(job.id);

            match result {
                Ok(_) => {
                    unreachable_streak = 0;
                    self.logs.success(format!("[{}/{}] {}", current, total, item));
                }
                Err(err) => {
                    failed += 1;
                    self.logs
                        .error(format!("[{}/{}] {} failed: {}", current, total, item, err));

                    match err {
                        AgentError::Rejected(_) => unreachable_streak = 0,
                        AgentError::Unreachable(_) => {
                            unreachable_streak += 1;
                            if unreachable_streak >= self.settings.unreachable_threshold {
                                return Outcome::Failed {
                                    reason: format!(
                                        "agent {} unreachable for {} consecutive item(s)",
                                        connection.endpoint, unreachable_streak
                                    ),
                                };
                            }
                        }
                        AgentError::Misconfigured(reason) => {
                            return Outcome::Failed { reason };
                        }
                    }
                }
            }

            if current < total {
                self.pace(current, cancel).await;
            }
        }

        if cancel.is_cancelled() {
            Outcome::Stopped { processed: total }
        } else {
            Outcome::Completed { failed }
        }
    }

    /// One agent round trip, bounded by the agent timeout
    async fn call_agent(
        &self,
        connection: &ConnectionConfig,
        item: &WorkItem,
    ) -> Result<AgentAck, AgentError> {
        let limit = self.settings.agent_timeout;
        match tokio::time::timeout(limit, self.agent.execute(connection, item)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Unreachable(format!(
                "no reply within {:?}",
                limit
            ))),
        }
    }

    /// Yields between items and pauses every `throttle_every` items
    ///
    /// The pause ends early on cancellation.
    async fn pace(&self, processed: usize, cancel: &CancellationToken) {
        let every = self.settings.throttle_every;
        if every == 0 || processed % every != 0 {
            tokio::task::yield_now().await;
            return;
        }

        debug!("Pacing pause at {} items", processed);
        self.logs
            .info(format!("Rate limit pause at {} entries", processed));
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.settings.throttle_pause) => {}
        }
    }

    /// Sends a single item immediately, outside the job registry
    ///
    /// `halt` is the emergency-stop token captured when the operation began;
    /// it is checked before the call and again once the reply is in.
    pub async fn execute_single(
        &self,
        item: &WorkItem,
        requested_endpoint: Option<&str>,
        halt: CancellationToken,
    ) -> Result<AgentAck, SingleOpError> {
        let connection = self.connection.require(requested_endpoint)?;

        if halt.is_cancelled() {
            return Err(SingleOpError::Halted);
        }

        self.logs.info(format!("Sending single {}", item));
        let result = self.call_agent(&connection, item).await;

        if halt.is_cancelled() {
            self.logs
                .warning(format!("Single {} halted by emergency stop", item));
            return Err(SingleOpError::Halted);
        }

        match result {
            Ok(ack) => {
                self.logs.success(format!("Single {} sent", item));
                Ok(ack)
            }
            Err(err) => {
                self.logs.error(format!("Single {} failed: {}", item, err));
                Err(err.into())
            }
        }
    }
}
