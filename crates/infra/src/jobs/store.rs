//! Job storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use super::types::{Job, JobId, JobStatus, ProcessingStats, StatsSnapshot, TerminalJobError};

/// Job store abstraction.
///
/// Owns the job collection and the aggregate counters. Every method is one
/// atomic step; implementations must not suspend while holding state.
pub trait JobStore: Send + Sync {
    /// Insert a freshly created job and count it in `total_jobs`.
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError>;

    /// Get a job by ID.
    fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Raise `items_processed` on a running job.
    fn record_progress(&self, id: JobId, items_processed: usize) -> Result<(), JobStoreError>;

    /// Complete a running job and fold its duration into the running mean.
    fn complete(&self, id: JobId, result: Vec<Value>, duration: Duration) -> Result<Job, JobStoreError>;

    /// Fail a running job.
    fn fail(&self, id: JobId, error: String) -> Result<Job, JobStoreError>;

    /// All jobs, newest first.
    fn list(&self) -> Result<Vec<Job>, JobStoreError>;

    /// Aggregate counters plus live counts.
    fn stats(&self) -> Result<StatsSnapshot, JobStoreError>;
}

impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        (**self).insert(job)
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
        (**self).get(id)
    }

    fn record_progress(&self, id: JobId, items_processed: usize) -> Result<(), JobStoreError> {
        (**self).record_progress(id, items_processed)
    }

    fn complete(&self, id: JobId, result: Vec<Value>, duration: Duration) -> Result<Job, JobStoreError> {
        (**self).complete(id, result, duration)
    }

    fn fail(&self, id: JobId, error: String) -> Result<Job, JobStoreError> {
        (**self).fail(id, error)
    }

    fn list(&self) -> Result<Vec<Job>, JobStoreError> {
        (**self).list()
    }

    fn stats(&self) -> Result<StatsSnapshot, JobStoreError> {
        (**self).stats()
    }
}

/// Job store error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TerminalJobError),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    stats: ProcessingStats,
}

/// In-memory job store.
///
/// Jobs are retained for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    inner: RwLock<Inner>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, JobStoreError> {
        self.inner
            .read()
            .map_err(|_| JobStoreError::Storage("job store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, JobStoreError> {
        self.inner
            .write()
            .map_err(|_| JobStoreError::Storage("job store lock poisoned".to_string()))
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
        let mut inner = self.write()?;
        if inner.jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        let id = job.id;
        inner.jobs.insert(id, job);
        inner.stats.total_jobs += 1;
        Ok(id)
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(self.read()?.jobs.get(&id).cloned())
    }

    fn record_progress(&self, id: JobId, items_processed: usize) -> Result<(), JobStoreError> {
        let mut inner = self.write()?;
        let job = inner.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        job.record_progress(items_processed)?;
        Ok(())
    }

    fn complete(&self, id: JobId, result: Vec<Value>, duration: Duration) -> Result<Job, JobStoreError> {
        let mut inner = self.write()?;
        let job = inner.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        job.mark_completed(result, Utc::now())?;
        let job = job.clone();
        inner.stats.record_completion(duration.as_secs_f64() * 1000.0);
        Ok(job)
    }

    fn fail(&self, id: JobId, error: String) -> Result<Job, JobStoreError> {
        let mut inner = self.write()?;
        let job = inner.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        job.mark_failed(error, Utc::now())?;
        let job = job.clone();
        inner.stats.record_failure();
        Ok(job)
    }

    fn list(&self) -> Result<Vec<Job>, JobStoreError> {
        let inner = self.read()?;
        let mut jobs: Vec<Job> = inner.jobs.values().cloned().collect();
        // Ids are UUIDv7, so they break ties between equal timestamps.
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(jobs)
    }

    fn stats(&self) -> Result<StatsSnapshot, JobStoreError> {
        let inner = self.read()?;
        let active_jobs = inner
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Processing)
            .count();
        Ok(StatsSnapshot {
            stats: inner.stats.clone(),
            active_jobs,
            total_jobs_in_memory: inner.jobs.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{ProcessingType, DEFAULT_PRIORITY};
    use serde_json::json;

    fn job(total: usize) -> Job {
        Job::new(ProcessingType::Transform, total, DEFAULT_PRIORITY)
    }

    #[test]
    fn insert_counts_total_and_rejects_duplicates() {
        let store = InMemoryJobStore::new();
        let j = job(5);
        let id = store.insert(j.clone()).unwrap();

        assert_eq!(store.get(id).unwrap(), Some(j.clone()));
        assert_eq!(store.insert(j), Err(JobStoreError::AlreadyExists(id)));

        let stats = store.stats().unwrap();
        assert_eq!(stats.stats.total_jobs, 1);
        assert_eq!(stats.active_jobs, 1);
        assert_eq!(stats.total_jobs_in_memory, 1);
    }

    #[test]
    fn completion_updates_counters_and_mean() {
        let store = InMemoryJobStore::new();
        let a = store.insert(job(1)).unwrap();
        let b = store.insert(job(1)).unwrap();

        store.complete(a, vec![json!(1)], Duration::from_millis(100)).unwrap();
        store.complete(b, vec![json!(2)], Duration::from_millis(300)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.stats.completed_jobs, 2);
        assert_eq!(stats.stats.failed_jobs, 0);
        assert_eq!(stats.active_jobs, 0);
        assert!((stats.stats.average_processing_time - 200.0).abs() < 1e-9);
    }

    #[test]
    fn failure_does_not_touch_the_mean() {
        let store = InMemoryJobStore::new();
        let id = store.insert(job(1)).unwrap();

        let failed = store.fail(id, "Processing timeout exceeded".to_string()).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.completed_at.is_some());

        let stats = store.stats().unwrap();
        assert_eq!(stats.stats.failed_jobs, 1);
        assert_eq!(stats.stats.completed_jobs, 0);
        assert_eq!(stats.stats.average_processing_time, 0.0);
    }

    #[test]
    fn terminal_jobs_reject_transitions() {
        let store = InMemoryJobStore::new();
        let id = store.insert(job(2)).unwrap();
        store.complete(id, vec![], Duration::from_millis(5)).unwrap();

        assert!(matches!(
            store.fail(id, "late".to_string()),
            Err(JobStoreError::InvalidTransition(_))
        ));
        assert!(matches!(
            store.record_progress(id, 2),
            Err(JobStoreError::InvalidTransition(_))
        ));

        let stats = store.stats().unwrap();
        assert_eq!(stats.stats.completed_jobs, 1);
        assert_eq!(stats.stats.failed_jobs, 0);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let store = InMemoryJobStore::new();
        let missing = JobId::new();
        assert_eq!(store.get(missing).unwrap(), None);
        assert_eq!(
            store.record_progress(missing, 1),
            Err(JobStoreError::NotFound(missing))
        );
    }

    #[test]
    fn list_is_newest_first() {
        let store = InMemoryJobStore::new();
        let first = store.insert(job(1)).unwrap();
        let second = store.insert(job(1)).unwrap();
        let third = store.insert(job(1)).unwrap();

        let ids: Vec<JobId> = store.list().unwrap().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[test]
    fn works_through_arc() {
        let store = InMemoryJobStore::arc();
        let shared: Arc<InMemoryJobStore> = Arc::clone(&store);
        let id = shared.insert(job(1)).unwrap();
        assert!(JobStore::get(&store, id).unwrap().is_some());
    }
}
