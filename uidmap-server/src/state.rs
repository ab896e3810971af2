//! Shared application state handed to every handler

use std::sync::Arc;
use uidmap_core::domain::connection::ConnectionConfig;

use crate::agent::AgentClient;
use crate::config::ServerConfig;
use crate::service::{
    BoundedLogSink, ConnectionStore, JobRegistry, JobRunner, LogSink, ProgressTracker,
    RunnerSettings,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub agent: Arc<dyn AgentClient>,
    pub logs: Arc<dyn LogSink>,
    pub connection: Arc<ConnectionStore>,
    pub runner: Arc<JobRunner>,
    pub registry: Arc<JobRegistry>,
}

impl AppState {
    /// Wires the job engine around `agent`
    ///
    /// The configured agent endpoint starts unverified.
    pub fn new(config: ServerConfig, agent: Arc<dyn AgentClient>) -> Self {
        let logs: Arc<dyn LogSink> = Arc::new(BoundedLogSink::new(config.log_capacity));
        let connection = Arc::new(ConnectionStore::new(
            ConnectionConfig::unverified(config.agent_url.clone()),
            Arc::clone(&logs),
        ));
        let tracker = Arc::new(ProgressTracker::new());
        let runner = Arc::new(JobRunner::new(
            Arc::clone(&agent),
            Arc::clone(&connection),
            Arc::clone(&logs),
            Arc::clone(&tracker),
            RunnerSettings::from(&config),
        ));
        let registry = Arc::new(JobRegistry::new(
            tracker,
            Arc::clone(&connection),
            Arc::clone(&logs),
            Arc::clone(&runner),
            config.emergency_grace,
        ));

        Self {
            config: Arc::new(config),
            agent,
            logs,
            connection,
            runner,
            registry,
        }
    }
}
