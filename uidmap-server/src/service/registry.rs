//! Job registry
//!
//! Admission control for bulk jobs. At most one job is Running or Stopping
//! at a time; the registry owns that job's cancellation token and the global
//! halt token every job token derives from.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uidmap_core::domain::job::{Job, JobKind, JobSnapshot, JobStatus, Progress};
use uuid::Uuid;

use crate::service::connection::{ConnectionError, ConnectionStore};
use crate::service::log_sink::LogSink;
use crate::service::progress::ProgressTracker;
use crate::service::runner::JobRunner;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job {0} is already running; stop it before starting another")]
    AlreadyRunning(Uuid),

    #[error(transparent)]
    ConfigUnverified(#[from] ConnectionError),
}

/// Identity of an admitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub id: Uuid,
    pub kind: JobKind,
    pub total: usize,
}

struct ActiveJob {
    id: Uuid,
    cancel: CancellationToken,
}

pub struct JobRegistry {
    tracker: Arc<ProgressTracker>,
    connection: Arc<ConnectionStore>,
    logs: Arc<dyn LogSink>,
    runner: Arc<JobRunner>,
    active: Mutex<Option<ActiveJob>>,
    halt: Mutex<CancellationToken>,
    emergency_grace: Duration,
}

impl JobRegistry {
    pub fn new(
        tracker: Arc<ProgressTracker>,
        connection: Arc<ConnectionStore>,
        logs: Arc<dyn LogSink>,
        runner: Arc<JobRunner>,
        emergency_grace: Duration,
    ) -> Self {
        Self {
            tracker,
            connection,
            logs,
            runner,
            active: Mutex::new(None),
            halt: Mutex::new(CancellationToken::new()),
            emergency_grace,
        }
    }

    /// Admits `job` and starts its runner task
    ///
    /// `requested_endpoint` is the agent the caller expects to talk to; it
    /// must match the verified connection.
    pub fn submit(
        &self,
        job: Job,
        requested_endpoint: Option<&str>,
    ) -> Result<JobHandle, RegistryError> {
        self.connection.require(requested_endpoint)?;

        let handle = JobHandle {
            id: job.id,
            kind: job.kind,
            total: job.total(),
        };

        let cancel = {
            let mut active = self.active.lock();
            if !self.tracker.try_begin(&job) {
                let running = self.tracker.snapshot().job_id.unwrap_or_else(Uuid::nil);
                warn!("Rejected {} job: job {} is still active", job.kind, running);
                return Err(RegistryError::AlreadyRunning(running));
            }

            let cancel = self.halt.lock().child_token();
            *active = Some(ActiveJob {
                id: job.id,
                cancel: cancel.clone(),
            });
            cancel
        };

        info!("Admitted {} job {} ({} items)", handle.kind, handle.id, handle.total);
        self.spawn(job, cancel);
        Ok(handle)
    }

    /// Runs the job on its own task, failing it if the task dies
    fn spawn(&self, job: Job, cancel: CancellationToken) {
        let runner = Arc::clone(&self.runner);
        let tracker = Arc::clone(&self.tracker);
        let logs = Arc::clone(&self.logs);
        let id = job.id;

        tokio::spawn(async move {
            let worker = tokio::spawn(async move { runner.run(job, cancel).await });
            if let Err(e) = worker.await {
                let reason = format!("runner task aborted: {}", e);
                logs.error(format!("Job {} failed: {}", id, reason));
                tracker.finish(id, JobStatus::Failed, Some(reason));
            }
        });
    }

    /// Requests a cooperative stop of the active job
    ///
    /// Returns `true` if a Running job was moved to Stopping. A stop aimed at
    /// another job, or with nothing running, changes nothing.
    pub fn stop(&self, job_id: Option<Uuid>) -> bool {
        let active = self.active.lock();
        let Some(job) = active.as_ref() else {
            return false;
        };
        if job_id.is_some_and(|id| id != job.id) {
            return false;
        }

        match self.tracker.mark_stopping(Some(job.id)) {
            Some(id) => {
                job.cancel.cancel();
                self.logs
                    .warning(format!("Stop requested for job {}", id));
                true
            }
            None => false,
        }
    }

    /// Halts everything in flight
    ///
    /// Cancels the halt token (and so every job token and in-flight single
    /// operation), installs a fresh one, then waits up to the grace period
    /// for the active job to settle. Returns `true` if a job was halted.
    pub async fn emergency_stop(&self) -> bool {
        let halted = {
            let _active = self.active.lock();
            let old = std::mem::replace(&mut *self.halt.lock(), CancellationToken::new());
            old.cancel();
            // A job already stopping is still halted and waited for.
            self.tracker.mark_stopping(None);
            let snapshot = self.tracker.snapshot();
            snapshot.status.is_active().then_some(snapshot.job_id).flatten()
        };

        let Some(id) = halted else {
            info!("Emergency stop with no active job");
            return false;
        };

        self.logs
            .warning(format!("EMERGENCY STOP: halting job {}", id));
        if !self.tracker.wait_inactive(self.emergency_grace).await {
            warn!(
                "Job {} did not settle within {:?} of the emergency stop",
                id, self.emergency_grace
            );
        }
        true
    }

    /// Token that single operations capture before they start
    pub fn halt_token(&self) -> CancellationToken {
        self.halt.lock().clone()
    }

    pub fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tracker.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedAgent;
    use crate::agent::{AgentClient, AgentError};
    use crate::service::log_sink::BoundedLogSink;
    use crate::service::runner::RunnerSettings;
    use tokio::sync::Barrier;
    use uidmap_core::domain::connection::ConnectionConfig;
    use uidmap_core::domain::log::LogLevel;
    use uidmap_core::dto::mapping::BulkMappingRequest;

    struct Fixture {
        agent: Arc<ScriptedAgent>,
        logs: Arc<BoundedLogSink>,
        connection: Arc<ConnectionStore>,
        registry: Arc<JobRegistry>,
    }

    fn fixture() -> Fixture {
        let agent = ScriptedAgent::new();
        let logs = Arc::new(BoundedLogSink::new(1000));
        let sink = Arc::clone(&logs) as Arc<dyn LogSink>;
        let connection = Arc::new(ConnectionStore::new(
            ConnectionConfig::verified("10.1.1.1:5006"),
            Arc::clone(&sink),
        ));
        let tracker = Arc::new(ProgressTracker::new());
        let runner = Arc::new(JobRunner::new(
            Arc::clone(&agent) as Arc<dyn AgentClient>,
            Arc::clone(&connection),
            Arc::clone(&sink),
            Arc::clone(&tracker),
            RunnerSettings {
                agent_timeout: Duration::from_secs(5),
                unreachable_threshold: 3,
                throttle_every: 0,
                throttle_pause: Duration::ZERO,
            },
        ));
        let registry = Arc::new(JobRegistry::new(
            tracker,
            Arc::clone(&connection),
            sink,
            runner,
            Duration::from_secs(2),
        ));
        Fixture {
            agent,
            logs,
            connection,
            registry,
        }
    }

    fn bulk_job(count: usize) -> Job {
        let request = BulkMappingRequest {
            count,
            user_prefix: "corp\\user".to_string(),
            base_ip: "10.0.0.1".to_string(),
            timeout: 60,
            operation: Default::default(),
            uia_url: None,
        };
        Job::new(JobKind::MappingLogin, request.work_items().unwrap()).unwrap()
    }

    async fn wait_terminal(registry: &JobRegistry) -> JobSnapshot {
        let mut rx = registry.subscribe();
        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.status.is_terminal()),
        )
        .await
        .expect("job should finish")
        .unwrap()
        .clone();
        snapshot
    }

    #[tokio::test]
    async fn test_rejected_item_scenario() {
        let f = fixture();
        f.agent
            .fail_call(2, AgentError::Rejected("user unknown".to_string()));

        let handle = f.registry.submit(bulk_job(5), None).unwrap();
        assert_eq!(handle.total, 5);

        let snapshot = wait_terminal(&f.registry).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.current, 5);
        assert_eq!(snapshot.job_id, Some(handle.id));

        let errors: Vec<_> = f
            .logs
            .recent(1000)
            .into_iter()
            .filter(|e| e.level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_stop_mid_run_scenario() {
        let f = fixture();
        let gate = f.agent.gate_from(10);

        let handle = f.registry.submit(bulk_job(100), None).unwrap();
        let mut rx = f.registry.subscribe();
        rx.wait_for(|s| s.current == 10).await.unwrap();

        assert!(f.registry.stop(Some(handle.id)));
        assert_eq!(f.registry.snapshot().status, JobStatus::Stopping);
        gate.add_permits(100);

        let snapshot = wait_terminal(&f.registry).await;
        assert_eq!(snapshot.status, JobStatus::Stopped);
        assert!(snapshot.current >= 10 && snapshot.current < 100);
        assert!(!f.registry.progress().running);

        // Frozen after the stop.
        let frozen = snapshot.current;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(f.registry.progress().current, frozen);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_submit_scenario() {
        const SUBMITTERS: usize = 16;

        for round in 0..50 {
            let f = fixture();
            let gate = f.agent.gate_from(0);
            let start = Arc::new(Barrier::new(SUBMITTERS));

            let submissions: Vec<_> = (0..SUBMITTERS)
                .map(|_| {
                    let registry = Arc::clone(&f.registry);
                    let start = Arc::clone(&start);
                    tokio::spawn(async move {
                        start.wait().await;
                        registry.submit(bulk_job(3), None)
                    })
                })
                .collect();

            let mut admitted = 0;
            let mut rejected = 0;
            for submission in submissions {
                match submission.await.unwrap() {
                    Ok(_) => admitted += 1,
                    Err(RegistryError::AlreadyRunning(_)) => rejected += 1,
                    Err(e) => panic!("round {}: unexpected error: {}", round, e),
                }
            }
            assert_eq!((admitted, rejected), (1, SUBMITTERS - 1), "round {}", round);

            gate.add_permits(3);
            let snapshot = wait_terminal(&f.registry).await;
            assert_eq!(snapshot.status, JobStatus::Completed);
            assert_eq!(snapshot.total, 3);
            assert_eq!(f.agent.calls(), 3);
        }
    }

    #[tokio::test]
    async fn test_submit_after_finish_is_admitted() {
        let f = fixture();
        f.registry.submit(bulk_job(2), None).unwrap();
        wait_terminal(&f.registry).await;

        let second = f.registry.submit(bulk_job(4), None).unwrap();
        let snapshot = wait_terminal(&f.registry).await;
        assert_eq!(snapshot.job_id, Some(second.id));
        assert_eq!(snapshot.current, 4);
    }

    #[tokio::test]
    async fn test_submit_requires_verified_connection() {
        let f = fixture();
        f.connection.invalidate();

        let err = f.registry.submit(bulk_job(2), None).unwrap_err();
        assert!(matches!(err, RegistryError::ConfigUnverified(_)));
        assert_eq!(f.registry.snapshot().status, JobStatus::Idle);
    }

    #[tokio::test]
    async fn test_submit_rejects_endpoint_mismatch() {
        let f = fixture();
        let err = f
            .registry
            .submit(bulk_job(2), Some("10.9.9.9:5006"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ConfigUnverified(ConnectionError::Mismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_emergency_stop_without_job() {
        let f = fixture();
        let before = f.logs.len();
        let old_halt = f.registry.halt_token();

        assert!(!f.registry.emergency_stop().await);
        assert_eq!(f.registry.snapshot().status, JobStatus::Idle);
        assert_eq!(f.logs.len(), before);

        assert!(old_halt.is_cancelled());
        assert!(!f.registry.halt_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_emergency_stop_halts_running_job() {
        let f = fixture();
        let gate = f.agent.gate_from(5);
        f.registry.submit(bulk_job(50), None).unwrap();

        let mut rx = f.registry.subscribe();
        rx.wait_for(|s| s.current == 5).await.unwrap();

        let releaser = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                gate.add_permits(50);
            })
        };
        assert!(f.registry.emergency_stop().await);
        releaser.await.unwrap();

        let snapshot = wait_terminal(&f.registry).await;
        assert_eq!(snapshot.status, JobStatus::Stopped);
        assert!(snapshot.current < 50);
        assert!(
            f.logs
                .recent(1000)
                .iter()
                .any(|e| e.message.contains("EMERGENCY STOP"))
        );

        // New work is accepted after the emergency stop.
        f.registry.submit(bulk_job(1), None).unwrap();
        assert_eq!(wait_terminal(&f.registry).await.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_emergency_stop_after_cooperative_stop() {
        let f = fixture();
        let gate = f.agent.gate_from(0);
        let handle = f.registry.submit(bulk_job(10), None).unwrap();

        assert!(f.registry.stop(None));
        assert_eq!(f.registry.snapshot().status, JobStatus::Stopping);

        let releaser = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                gate.add_permits(10);
            })
        };
        assert!(f.registry.emergency_stop().await);

        // The grace wait covered the stopping job.
        let snapshot = f.registry.snapshot();
        assert_eq!(snapshot.status, JobStatus::Stopped);
        assert_eq!(snapshot.job_id, Some(handle.id));
        assert!(
            f.logs
                .recent(1000)
                .iter()
                .any(|e| e.message.contains(&format!("EMERGENCY STOP: halting job {}", handle.id)))
        );
        releaser.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_is_a_no_op_when_idle_or_mismatched() {
        let f = fixture();
        assert!(!f.registry.stop(None));

        let gate = f.agent.gate_from(0);
        let handle = f.registry.submit(bulk_job(3), None).unwrap();
        assert!(!f.registry.stop(Some(Uuid::new_v4())));
        assert_eq!(f.registry.snapshot().status, JobStatus::Running);

        assert!(f.registry.stop(None));
        assert!(!f.registry.stop(Some(handle.id)));
        gate.add_permits(3);

        assert_eq!(wait_terminal(&f.registry).await.status, JobStatus::Stopped);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let f = fixture();
        let mut rx = f.registry.subscribe();
        f.registry.submit(bulk_job(200), None).unwrap();

        let mut last = 0;
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let snapshot = rx.borrow_and_update().clone();
            assert!(snapshot.current >= last);
            assert!(snapshot.current <= snapshot.total);
            last = snapshot.current;
            if snapshot.status.is_terminal() {
                break;
            }
        }
        assert_eq!(last, 200);
    }
}
