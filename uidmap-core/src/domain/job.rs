//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::work_item::WorkItem;
use crate::error::BatchError;

/// A named run of ordered work items of a single operation kind
///
/// Created on batch submission and replaced (never mutated) by the next one.
/// Live counters live in [`JobSnapshot`], not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub items: Vec<WorkItem>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Creates a job, checking that the batch is non-empty and homogeneous
    pub fn new(kind: JobKind, items: Vec<WorkItem>) -> Result<Self, BatchError> {
        if items.is_empty() {
            return Err(BatchError::Empty);
        }

        if let Some((index, item)) = items.iter().enumerate().find(|(_, i)| i.kind() != kind) {
            return Err(BatchError::MixedKinds {
                index,
                expected: kind,
                found: item.kind(),
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            items,
            created_at: Utc::now(),
        })
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }
}

/// Operation kind of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    MappingLogin,
    MappingLogout,
    AddressTagRegister,
    AddressTagUnregister,
    UserTagRegister,
    UserTagUnregister,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::MappingLogin => "mapping login",
            JobKind::MappingLogout => "mapping logout",
            JobKind::AddressTagRegister => "address tag register",
            JobKind::AddressTagUnregister => "address tag unregister",
            JobKind::UserTagRegister => "user tag register",
            JobKind::UserTagUnregister => "user tag unregister",
        };
        write!(f, "{}", name)
    }
}

/// Job execution status
///
/// `Idle` only appears before the first submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Stopping,
    Stopped,
    Completed,
    Failed,
}

impl JobStatus {
    /// Running or Stopping: the job still owns the exclusivity slot
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Running | JobStatus::Stopping)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Stopped | JobStatus::Completed | JobStatus::Failed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Consistent view of the most recent job
///
/// Readers always get a whole snapshot; `current <= total` holds in every one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: Option<Uuid>,
    pub kind: Option<JobKind>,
    pub current: usize,
    pub total: usize,
    pub status: JobStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Reason the job ended in `Failed`
    pub failure: Option<String>,
}

impl JobSnapshot {
    /// Fresh Running snapshot for a newly admitted job
    pub fn started(job: &Job) -> Self {
        Self {
            job_id: Some(job.id),
            kind: Some(job.kind),
            current: 0,
            total: job.total(),
            status: JobStatus::Running,
            created_at: Some(job.created_at),
            completed_at: None,
            failure: None,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current,
            total: self.total,
            running: self.status.is_active(),
        }
    }
}

/// Progress triple served to polling observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::work_item::MappingOperation;

    fn login(n: u32) -> WorkItem {
        WorkItem::mapping(MappingOperation::Login, format!("10.0.0.{}", n), "u", 60)
    }

    #[test]
    fn test_new_job() {
        let job = Job::new(JobKind::MappingLogin, vec![login(1), login(2)]).unwrap();
        assert_eq!(job.total(), 2);
        assert_eq!(job.kind, JobKind::MappingLogin);
    }

    #[test]
    fn test_new_job_rejects_empty_batch() {
        assert!(matches!(
            Job::new(JobKind::MappingLogin, vec![]),
            Err(BatchError::Empty)
        ));
    }

    #[test]
    fn test_new_job_rejects_mixed_kinds() {
        let items = vec![
            login(1),
            WorkItem::mapping(MappingOperation::Logout, "10.0.0.2", "u", 60),
        ];
        match Job::new(JobKind::MappingLogin, items) {
            Err(BatchError::MixedKinds { index, found, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(found, JobKind::MappingLogout);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_status_classes() {
        assert!(JobStatus::Running.is_active());
        assert!(JobStatus::Stopping.is_active());
        assert!(!JobStatus::Idle.is_active());
        assert!(!JobStatus::Completed.is_active());

        assert!(JobStatus::Stopped.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Stopping.is_terminal());
        assert!(!JobStatus::Idle.is_terminal());
    }

    #[test]
    fn test_snapshot_progress() {
        let job = Job::new(JobKind::MappingLogin, vec![login(1)]).unwrap();
        let mut snapshot = JobSnapshot::started(&job);
        assert_eq!(
            snapshot.progress(),
            Progress {
                current: 0,
                total: 1,
                running: true
            }
        );

        snapshot.status = JobStatus::Stopping;
        assert!(snapshot.progress().running);

        snapshot.status = JobStatus::Stopped;
        assert!(!snapshot.progress().running);
    }

    #[test]
    fn test_idle_snapshot_default() {
        let snapshot = JobSnapshot::default();
        assert_eq!(snapshot.status, JobStatus::Idle);
        assert_eq!(snapshot.progress(), Progress::default());
    }
}
