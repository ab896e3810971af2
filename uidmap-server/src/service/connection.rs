//! Connection config store
//!
//! Process-wide holder of the agent endpoint. Updates replace the whole
//! `Arc<ConnectionConfig>`, so readers (the runner reads it once per item)
//! never observe a half-written endpoint.

use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use uidmap_core::domain::connection::ConnectionConfig;
use uidmap_core::error::EndpointError;

use crate::agent::{AgentClient, ProbeError};
use crate::service::log_sink::LogSink;

/// The active connection cannot be used for a request
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("agent connection {0} is not verified; run a connection test first")]
    Unverified(String),

    #[error("requested agent {requested} does not match the verified agent {active}")]
    Mismatch { requested: String, active: String },
}

pub struct ConnectionStore {
    current: RwLock<Arc<ConnectionConfig>>,
    logs: Arc<dyn LogSink>,
}

impl ConnectionStore {
    pub fn new(initial: ConnectionConfig, logs: Arc<dyn LogSink>) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            logs,
        }
    }

    pub fn current(&self) -> Arc<ConnectionConfig> {
        Arc::clone(&self.current.read())
    }

    /// The verified connection, checked against the endpoint a request names
    pub fn require(&self, requested: Option<&str>) -> Result<Arc<ConnectionConfig>, ConnectionError> {
        let current = self.current();

        if !current.verified {
            return Err(ConnectionError::Unverified(current.endpoint.clone()));
        }

        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            Some(requested) if requested != current.endpoint => Err(ConnectionError::Mismatch {
                requested: requested.to_string(),
                active: current.endpoint.clone(),
            }),
            _ => Ok(current),
        }
    }

    /// Probes `endpoint` and makes it the verified connection on success
    ///
    /// A failed probe leaves the previous endpoint in place but unverified,
    /// which fails any running job at its next item.
    pub async fn verify(
        &self,
        agent: &dyn AgentClient,
        endpoint: &str,
    ) -> Result<Arc<ConnectionConfig>, ProbeError> {
        let endpoint = endpoint.trim();
        self.logs
            .info(format!("Connection test requested: {}", endpoint));

        match agent.probe(endpoint).await {
            Ok(()) => {
                let verified = Arc::new(ConnectionConfig::verified(endpoint));
                *self.current.write() = Arc::clone(&verified);
                self.logs
                    .success(format!("Connection to {} verified and saved", endpoint));
                Ok(verified)
            }
            Err(e) => {
                self.invalidate();
                self.logs.error(format!("Verification failed: {}", e));
                Err(e)
            }
        }
    }

    /// Saves `endpoint` as verified without probing it
    pub fn force(&self, endpoint: &str) -> Result<Arc<ConnectionConfig>, EndpointError> {
        let endpoint = endpoint.trim();
        ConnectionConfig::parse_endpoint(endpoint)?;

        let forced = Arc::new(ConnectionConfig::verified(endpoint));
        *self.current.write() = Arc::clone(&forced);
        self.logs.warning(format!(
            "Bypassing verification as requested for {}",
            endpoint
        ));
        Ok(forced)
    }

    /// Marks the active endpoint unverified
    pub fn invalidate(&self) {
        let mut current = self.current.write();
        if current.verified {
            *current = Arc::new(ConnectionConfig::unverified(current.endpoint.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ProbeStage;
    use crate::agent::testing::ScriptedAgent;
    use crate::service::log_sink::BoundedLogSink;
    use uidmap_core::domain::log::LogLevel;

    fn store(logs: &Arc<BoundedLogSink>) -> ConnectionStore {
        ConnectionStore::new(
            ConnectionConfig::unverified("127.0.0.1:5006"),
            Arc::clone(logs) as Arc<dyn LogSink>,
        )
    }

    #[tokio::test]
    async fn test_verify_success_replaces_config() {
        let logs = Arc::new(BoundedLogSink::new(10));
        let store = store(&logs);
        let agent = ScriptedAgent::new();

        let before = store.current();
        store.verify(agent.as_ref(), "10.1.1.1:5006").await.unwrap();

        let after = store.current();
        assert_eq!(after.endpoint, "10.1.1.1:5006");
        assert!(after.verified);
        // Readers holding the old Arc keep a consistent, untouched view.
        assert_eq!(before.endpoint, "127.0.0.1:5006");
        assert!(!before.verified);

        assert_eq!(logs.recent(1)[0].level, LogLevel::Success);
    }

    #[tokio::test]
    async fn test_verify_failure_unverifies_active_config() {
        let logs = Arc::new(BoundedLogSink::new(10));
        let store = store(&logs);
        store.force("10.1.1.1:5006").unwrap();

        let agent = ScriptedAgent::new();
        agent.fail_probe(ProbeError::new(ProbeStage::Tcp, "port closed"));

        let err = store.verify(agent.as_ref(), "10.9.9.9:5006").await.unwrap_err();
        assert_eq!(err.stage, ProbeStage::Tcp);

        let current = store.current();
        assert_eq!(current.endpoint, "10.1.1.1:5006");
        assert!(!current.verified);

        let last = &logs.recent(1)[0];
        assert_eq!(last.level, LogLevel::Error);
        assert!(last.message.contains("[TCP] port closed"));
    }

    #[test]
    fn test_require() {
        let logs = Arc::new(BoundedLogSink::new(10));
        let store = store(&logs);

        assert!(matches!(store.require(None), Err(ConnectionError::Unverified(_))));

        store.force("10.1.1.1:5006").unwrap();
        assert!(store.require(None).is_ok());
        assert!(store.require(Some("10.1.1.1:5006")).is_ok());
        assert!(store.require(Some("")).is_ok());
        assert!(matches!(
            store.require(Some("10.2.2.2:5006")),
            Err(ConnectionError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_force_validates_endpoint() {
        let logs = Arc::new(BoundedLogSink::new(10));
        let store = store(&logs);
        assert!(store.force("missing-port").is_err());
        assert!(!store.current().verified);
    }
}
