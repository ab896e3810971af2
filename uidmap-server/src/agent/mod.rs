//! Agent client adapter
//!
//! One remote call per work item against the UIA agent, plus the
//! connectivity probe used to verify an endpoint. The adapter holds no job
//! state; it only classifies the outcome of each call.

pub mod http;
pub mod message;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uidmap_core::domain::connection::ConnectionConfig;
use uidmap_core::domain::work_item::WorkItem;

pub use http::HttpAgentClient;

/// Successful agent reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAck {
    pub status: u16,
    pub body: String,
}

/// Why a single agent call failed
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The endpoint could not be reached (connect, TLS or timeout failure)
    #[error("agent unreachable: {0}")]
    Unreachable(String),

    /// The agent answered but declined this operation
    #[error("agent rejected the operation: {0}")]
    Rejected(String),

    /// Local client material (certificates, endpoint syntax) is unusable
    #[error("agent client misconfigured: {0}")]
    Misconfigured(String),
}

/// Stage of the connectivity probe that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Format,
    Tcp,
    Api,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStage::Format => write!(f, "Format"),
            ProbeStage::Tcp => write!(f, "TCP"),
            ProbeStage::Api => write!(f, "mTLS/API"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("[{stage}] {message}")]
pub struct ProbeError {
    pub stage: ProbeStage,
    pub message: String,
}

impl ProbeError {
    pub fn new(stage: ProbeStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Client for the external enforcement agent
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Sends one work item to the agent at `connection`
    async fn execute(
        &self,
        connection: &ConnectionConfig,
        item: &WorkItem,
    ) -> Result<AgentAck, AgentError>;

    /// Checks that `endpoint` is reachable and answers the agent protocol
    async fn probe(&self, endpoint: &str) -> Result<(), ProbeError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted agent for engine and API tests

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Agent whose replies are scripted per call index (0-based)
    ///
    /// With a gate installed, call `n >= gate_from` waits for a permit before
    /// answering, which lets a test hold a job mid-flight.
    #[derive(Default)]
    pub struct ScriptedAgent {
        calls: AtomicUsize,
        failures: Mutex<HashMap<usize, AgentError>>,
        fail_all: Mutex<Option<AgentError>>,
        probe_result: Mutex<Option<ProbeError>>,
        gate: Mutex<Option<(usize, Arc<Semaphore>)>>,
        executed: Mutex<Vec<WorkItem>>,
    }

    impl ScriptedAgent {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn fail_call(&self, index: usize, error: AgentError) {
            self.failures.lock().insert(index, error);
        }

        pub fn fail_all(&self, error: AgentError) {
            *self.fail_all.lock() = Some(error);
        }

        pub fn fail_probe(&self, error: ProbeError) {
            *self.probe_result.lock() = Some(error);
        }

        /// Blocks calls from `from` onwards until permits are released
        pub fn gate_from(&self, from: usize) -> Arc<Semaphore> {
            let semaphore = Arc::new(Semaphore::new(0));
            *self.gate.lock() = Some((from, Arc::clone(&semaphore)));
            semaphore
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn executed(&self) -> Vec<WorkItem> {
            self.executed.lock().clone()
        }
    }

    #[async_trait]
    impl AgentClient for ScriptedAgent {
        async fn execute(
            &self,
            _connection: &ConnectionConfig,
            item: &WorkItem,
        ) -> Result<AgentAck, AgentError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);

            let gate = self
                .gate
                .lock()
                .as_ref()
                .filter(|(from, _)| index >= *from)
                .map(|(_, semaphore)| Arc::clone(semaphore));
            if let Some(semaphore) = gate {
                semaphore.acquire().await.unwrap().forget();
            }

            self.executed.lock().push(item.clone());

            if let Some(error) = self.fail_all.lock().clone() {
                return Err(error);
            }
            if let Some(error) = self.failures.lock().get(&index).cloned() {
                return Err(error);
            }
            Ok(AgentAck {
                status: 200,
                body: "<response status=\"success\"/>".to_string(),
            })
        }

        async fn probe(&self, _endpoint: &str) -> Result<(), ProbeError> {
            match self.probe_result.lock().clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }
}
