//! Progress tracker
//!
//! Holds the live snapshot of the most recent job. Backed by a
//! `tokio::sync::watch` channel: every write replaces or edits the whole
//! snapshot under the channel's lock, so readers always see a consistent
//! `{current, total, status}` triple and never block the runner for longer
//! than a clone.

use std::time::Duration;
use tokio::sync::watch;
use uidmap_core::domain::job::{Job, JobSnapshot, JobStatus, Progress};
use uuid::Uuid;

pub struct ProgressTracker {
    tx: watch::Sender<JobSnapshot>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(JobSnapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    pub fn progress(&self) -> Progress {
        self.tx.borrow().progress()
    }

    /// Receiver that is notified on every change
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    /// Admits `job` unless another job is still active
    ///
    /// The check and the replacement happen under the channel's write lock,
    /// which makes this a compare-and-set on the job status.
    pub(crate) fn try_begin(&self, job: &Job) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.status.is_active() {
                return false;
            }
            *snapshot = JobSnapshot::started(job);
            true
        })
    }

    /// Counts one more processed item for `job_id`, never past `total`
    pub(crate) fn advance(&self, job_id: Uuid) -> usize {
        let mut current = 0;
        self.tx.send_if_modified(|snapshot| {
            current = snapshot.current;
            if snapshot.job_id != Some(job_id) || snapshot.current >= snapshot.total {
                return false;
            }
            snapshot.current += 1;
            current = snapshot.current;
            true
        });
        current
    }

    /// Running -> Stopping for the current job, or for `job_id` if given
    ///
    /// Returns the id of the job that was moved to Stopping.
    pub(crate) fn mark_stopping(&self, job_id: Option<Uuid>) -> Option<Uuid> {
        let mut stopped = None;
        self.tx.send_if_modified(|snapshot| {
            let targeted = job_id.is_none() || snapshot.job_id == job_id;
            if !targeted || snapshot.status != JobStatus::Running {
                return false;
            }
            snapshot.status = JobStatus::Stopping;
            stopped = snapshot.job_id;
            true
        });
        stopped
    }

    /// Moves an active job to a terminal status
    ///
    /// Ignored if the job is not the tracked one or already terminal.
    pub(crate) fn finish(&self, job_id: Uuid, status: JobStatus, failure: Option<String>) -> bool {
        debug_assert!(status.is_terminal());
        self.tx.send_if_modified(|snapshot| {
            if snapshot.job_id != Some(job_id) || !snapshot.status.is_active() {
                return false;
            }
            snapshot.status = status;
            snapshot.completed_at = Some(chrono::Utc::now());
            snapshot.failure = failure;
            true
        })
    }

    /// Waits until no job is active; `false` if `limit` elapsed first
    pub async fn wait_inactive(&self, limit: Duration) -> bool {
        let mut rx = self.subscribe();
        matches!(
            tokio::time::timeout(limit, rx.wait_for(|s| !s.status.is_active())).await,
            Ok(Ok(_))
        )
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
