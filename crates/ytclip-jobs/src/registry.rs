//! In-memory job registry.
//!
//! One mutex guards the whole map. Callers never get references into it, only
//! cloned snapshots, so a multi-field update is never observed half-applied.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, error};
use ytclip_models::{Job, JobId, JobStatus, TransitionError};

use crate::error::{JobsError, JobsResult};

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        // A panic while holding the lock cannot leave a record half-written:
        // every mutation validates before assigning.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new queued job and return its ID.
    pub fn create(&self) -> JobId {
        let job = Job::new();
        let id = job.id.clone();
        self.lock().insert(id.clone(), job);
        debug!(job_id = %id, "Job created");
        id
    }

    pub fn start(&self, id: &JobId) -> JobsResult<()> {
        self.update(id, |job| job.start())
    }

    pub fn complete(&self, id: &JobId, file_path: impl Into<String>) -> JobsResult<()> {
        let file_path = file_path.into();
        self.update(id, move |job| job.complete(file_path))
    }

    pub fn fail(&self, id: &JobId, message: impl Into<String>) -> JobsResult<()> {
        let message = message.into();
        self.update(id, move |job| job.fail(message))
    }

    fn update<F>(&self, id: &JobId, apply: F) -> JobsResult<()>
    where
        F: FnOnce(&mut Job) -> Result<(), TransitionError>,
    {
        let mut jobs = self.lock();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobsError::NotFound(id.clone()))?;

        apply(job).map_err(|source| {
            error!(job_id = %id, "Rejected job transition: {}", source);
            JobsError::InvalidTransition {
                id: id.clone(),
                source,
            }
        })
    }

    /// Snapshot of the current record.
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    pub fn remove(&self, id: &JobId) -> Option<Job> {
        self.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove completed jobs (and failed ones when `include_failed`) that
    /// finished before `cutoff`. Returns the number removed.
    pub fn sweep_finished(&self, cutoff: DateTime<Utc>, include_failed: bool) -> usize {
        let mut jobs = self.lock();
        let before = jobs.len();

        jobs.retain(|_, job| {
            let sweepable = match job.status {
                JobStatus::Completed => true,
                JobStatus::Error => include_failed,
                JobStatus::Queued | JobStatus::Processing => false,
            };
            let expired = job.finished_at().is_some_and(|at| at < cutoff);
            !(sweepable && expired)
        });

        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_create_is_queued() {
        let registry = JobRegistry::new();
        let id = registry.create();

        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.file_path.is_none());
    }

    #[test]
    fn test_unknown_id() {
        let registry = JobRegistry::new();
        registry.create();

        let unknown = JobId::from_string("never-created");
        assert!(registry.get(&unknown).is_none());
        assert!(registry.start(&unknown).unwrap_err().is_not_found());
        assert!(registry.complete(&unknown, "x").unwrap_err().is_not_found());
        assert!(registry.fail(&unknown, "x").unwrap_err().is_not_found());
        assert!(registry.remove(&unknown).is_none());
    }

    #[test]
    fn test_lifecycle() {
        let registry = JobRegistry::new();
        let id = registry.create();

        registry.start(&id).unwrap();
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.started_at.is_some());

        registry.complete(&id, "./videos/a.mp4").unwrap();
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.file_path.as_deref(), Some("./videos/a.mp4"));
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_illegal_transition_leaves_record_unchanged() {
        let registry = JobRegistry::new();
        let id = registry.create();
        registry.start(&id).unwrap();
        registry.complete(&id, "a.mp4").unwrap();

        let before = registry.get(&id).unwrap();
        let err = registry.start(&id).unwrap_err();
        assert!(matches!(err, JobsError::InvalidTransition { .. }));
        assert!(registry.fail(&id, "late").is_err());
        assert_eq!(registry.get(&id).unwrap(), before);
    }

    #[test]
    fn test_snapshots_are_detached() {
        let registry = JobRegistry::new();
        let id = registry.create();

        let mut snapshot = registry.get(&id).unwrap();
        snapshot.status = JobStatus::Completed;

        assert_eq!(registry.get(&id).unwrap().status, JobStatus::Queued);
    }

    #[test]
    fn test_sweep_finished() {
        let registry = JobRegistry::new();

        let done = registry.create();
        registry.start(&done).unwrap();
        registry.complete(&done, "a.mp4").unwrap();

        let failed = registry.create();
        registry.fail(&failed, "boom").unwrap();

        let running = registry.create();
        registry.start(&running).unwrap();

        // Nothing finished an hour ago
        assert_eq!(registry.sweep_finished(Utc::now() - Duration::hours(1), true), 0);

        let cutoff = Utc::now() + Duration::seconds(1);
        assert_eq!(registry.sweep_finished(cutoff, false), 1);
        assert!(registry.get(&done).is_none());
        assert!(registry.get(&failed).is_some());

        assert_eq!(registry.sweep_finished(cutoff, true), 1);
        assert!(registry.get(&failed).is_none());
        assert!(registry.get(&running).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_updates() {
        let registry = Arc::new(JobRegistry::new());
        let ids: Vec<JobId> = (0..32).map(|_| registry.create()).collect();

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry.start(&id).unwrap();
                    registry.complete(&id, format!("{id}.mp4")).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for id in &ids {
            let job = registry.get(id).unwrap();
            assert_eq!(job.status, JobStatus::Completed);
            assert_eq!(job.file_path, Some(format!("{id}.mp4")));
        }
    }
}
