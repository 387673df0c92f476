//! Job submission and chunked execution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, error, info};

use meridian_core::DomainError;

use super::processors::{ChunkProcessor, ProcessingError};
use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobId, ProcessRequest, ProcessingType, StatsSnapshot, SubmitReceipt};

/// Job tracker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    /// Items per chunk
    pub batch_size: usize,
    /// Wall-clock budget per job, checked before each chunk
    pub max_processing_time: Duration,
    /// Simulated work per chunk
    pub chunk_delay: Duration,
    /// Name stamped on transformed items
    pub processed_by: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_processing_time: Duration::from_millis(30_000),
            chunk_delay: Duration::from_millis(100),
            processed_by: "service-b".to_string(),
        }
    }
}

impl ProcessingConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_processing_time(mut self, max: Duration) -> Self {
        self.max_processing_time = max;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_processed_by(mut self, name: impl Into<String>) -> Self {
        self.processed_by = name.into();
        self
    }
}

/// Rejected submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Items processed once chunk `chunk_index` is done.
pub(crate) fn progress_after(chunk_index: usize, batch_size: usize, total_items: usize) -> usize {
    (chunk_index + 1).saturating_mul(batch_size).min(total_items)
}

enum RunError {
    Processing(ProcessingError),
    Store(JobStoreError),
}

impl From<ProcessingError> for RunError {
    fn from(e: ProcessingError) -> Self {
        RunError::Processing(e)
    }
}

impl From<JobStoreError> for RunError {
    fn from(e: JobStoreError) -> Self {
        RunError::Store(e)
    }
}

/// Accepts batch requests and runs each one in its own task.
#[derive(Debug)]
pub struct JobTracker<S> {
    store: Arc<S>,
    config: Arc<ProcessingConfig>,
}

impl<S> Clone for JobTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> JobTracker<S>
where
    S: JobStore + 'static,
{
    pub fn new(store: Arc<S>, config: ProcessingConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Create a job and start it in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: ProcessRequest) -> Result<SubmitReceipt, SubmitError> {
        request.validate()?;

        let job = Job::new(request.kind, request.data.len(), request.effective_priority());
        let id = self.store.insert(job)?;

        info!(
            job_id = %id,
            kind = request.kind.as_str(),
            total_items = request.data.len(),
            priority = request.effective_priority(),
            "batch_started"
        );

        let store = Arc::clone(&self.store);
        let config = Arc::clone(&self.config);
        tokio::spawn(run_job(store, config, id, request.kind, request.data, request.options));

        Ok(SubmitReceipt::accepted(id))
    }

    /// All jobs, newest first.
    pub fn jobs(&self) -> Result<Vec<Job>, JobStoreError> {
        self.store.list()
    }

    /// Look up a job. Malformed ids are simply not found.
    pub fn job(&self, raw_id: &str) -> Result<Option<Job>, JobStoreError> {
        match raw_id.parse::<JobId>() {
            Ok(id) => self.store.get(id),
            Err(_) => Ok(None),
        }
    }

    pub fn stats(&self) -> Result<StatsSnapshot, JobStoreError> {
        self.store.stats()
    }
}

async fn run_job<S: JobStore>(
    store: Arc<S>,
    config: Arc<ProcessingConfig>,
    id: JobId,
    kind: ProcessingType,
    data: Vec<Value>,
    options: Option<Map<String, Value>>,
) {
    let started = Instant::now();

    let outcome = match execute(&*store, &config, id, kind, &data, options.as_ref(), started).await {
        Ok(result) => store
            .complete(id, result, started.elapsed())
            .map(|job| {
                let elapsed = started.elapsed();
                let secs = elapsed.as_secs_f64();
                let throughput = if secs > 0.0 { data.len() as f64 / secs } else { data.len() as f64 };
                info!(
                    job_id = %id,
                    duration_ms = elapsed.as_millis() as u64,
                    items = job.total_items,
                    items_per_sec = throughput,
                    "batch_completed"
                );
            }),
        Err(RunError::Processing(e)) => {
            error!(job_id = %id, error = %e, "batch_failed");
            store.fail(id, e.to_string()).map(|_| ())
        }
        Err(RunError::Store(e)) => Err(e),
    };

    if let Err(e) = outcome {
        error!(job_id = %id, error = %e, "job store rejected update; abandoning job");
    }
}

async fn execute<S: JobStore + ?Sized>(
    store: &S,
    config: &ProcessingConfig,
    id: JobId,
    kind: ProcessingType,
    data: &[Value],
    options: Option<&Map<String, Value>>,
    started: Instant,
) -> Result<Vec<Value>, RunError> {
    let processor = ChunkProcessor::from_request(kind, options, &config.processed_by)?;
    let batch_size = config.batch_size.max(1);
    let total_items = data.len();
    let mut results = Vec::new();

    for (chunk_index, chunk) in data.chunks(batch_size).enumerate() {
        let elapsed = started.elapsed();
        if elapsed > config.max_processing_time {
            return Err(ProcessingError::Timeout {
                elapsed_ms: elapsed.as_millis(),
                limit_ms: config.max_processing_time.as_millis(),
            }
            .into());
        }

        if !config.chunk_delay.is_zero() {
            tokio::time::sleep(config.chunk_delay).await;
        }

        results.extend(processor.process(chunk, chunk_index * batch_size, Utc::now())?);

        let processed = progress_after(chunk_index, batch_size, total_items);
        store.record_progress(id, processed)?;

        debug!(
            job_id = %id,
            chunk_index,
            items_processed = processed,
            progress_pct = processed as f64 / total_items as f64 * 100.0,
            "chunk_processed"
        );
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::store::InMemoryJobStore;
    use crate::jobs::types::JobStatus;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tracker(config: ProcessingConfig) -> JobTracker<InMemoryJobStore> {
        JobTracker::new(InMemoryJobStore::arc(), config)
    }

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("options must be an object, got {other}"),
        }
    }

    fn items(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "id": i, "value": i })).collect()
    }

    async fn wait_until_done<S: JobStore + 'static>(tracker: &JobTracker<S>, id: JobId) -> Job {
        for _ in 0..10_000 {
            if let Some(job) = tracker.job(&id.to_string()).unwrap() {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never finished");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_returns_accepted_and_completes() {
        let tracker = tracker(ProcessingConfig::default());
        let receipt = tracker
            .submit(ProcessRequest::new(ProcessingType::Transform, items(250)))
            .unwrap();
        assert_eq!(receipt.status, "accepted");

        let job = tracker.job(&receipt.job_id.to_string()).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.items_processed, 0);
        assert_eq!(job.total_items, 250);
        assert_eq!(job.priority, 3);

        let job = wait_until_done(&tracker, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.items_processed, 250);
        assert_eq!(job.result.as_ref().map(Vec::len), Some(250));
        assert!(job.error.is_none());

        let stats = tracker.stats().unwrap();
        assert_eq!(stats.stats.total_jobs, 1);
        assert_eq!(stats.stats.completed_jobs, 1);
        assert_eq!(stats.active_jobs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_priority_creates_no_job() {
        let tracker = tracker(ProcessingConfig::default());
        let err = tracker
            .submit(ProcessRequest::new(ProcessingType::Filter, items(1)).with_priority(9))
            .unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(DomainError::Validation(_))));
        assert_eq!(tracker.stats().unwrap().stats.total_jobs, 0);
        assert!(tracker.jobs().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_the_job_between_chunks() {
        let tracker = tracker(
            ProcessingConfig::default()
                .with_batch_size(1)
                .with_chunk_delay(Duration::from_millis(100))
                .with_max_processing_time(Duration::from_millis(150)),
        );
        let receipt = tracker
            .submit(ProcessRequest::new(ProcessingType::Transform, items(3)))
            .unwrap();

        let job = wait_until_done(&tracker, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("Processing timeout exceeded"));
        assert_eq!(job.items_processed, 2);
        assert!(job.result.is_none());
        assert!(job.completed_at.is_some());

        let stats = tracker.stats().unwrap();
        assert_eq!(stats.stats.completed_jobs, 0);
        assert_eq!(stats.stats.failed_jobs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn average_processing_time_is_a_running_mean() {
        let tracker = tracker(
            ProcessingConfig::default()
                .with_batch_size(1)
                .with_chunk_delay(Duration::from_millis(100)),
        );
        let short = tracker
            .submit(ProcessRequest::new(ProcessingType::Filter, items(1)))
            .unwrap();
        wait_until_done(&tracker, short.job_id).await;
        let long = tracker
            .submit(ProcessRequest::new(ProcessingType::Filter, items(3)))
            .unwrap();
        wait_until_done(&tracker, long.job_id).await;

        let stats = tracker.stats().unwrap();
        assert_eq!(stats.stats.completed_jobs, 2);
        assert!(
            (stats.stats.average_processing_time - 200.0).abs() < 1.0,
            "average was {}",
            stats.stats.average_processing_time
        );
    }

    #[tokio::test(start_paused = true)]
    async fn non_object_item_fails_transform() {
        let tracker = tracker(ProcessingConfig::default());
        let receipt = tracker
            .submit(ProcessRequest::new(
                ProcessingType::Transform,
                vec![json!({"id": 1}), json!("loose")],
            ))
            .unwrap();

        let job = wait_until_done(&tracker, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("item 1 is not a JSON object"));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_options_fail_the_job() {
        let tracker = tracker(ProcessingConfig::default());
        let receipt = tracker
            .submit(
                ProcessRequest::new(ProcessingType::Filter, items(2))
                    .with_options(options(json!({"conditions": "nope"}))),
            )
            .unwrap();

        let job = wait_until_done(&tracker, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.items_processed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn aggregate_emits_one_record_per_chunk() {
        let tracker = tracker(ProcessingConfig::default().with_batch_size(2));
        let receipt = tracker
            .submit(
                ProcessRequest::new(
                    ProcessingType::Aggregate,
                    vec![json!({"value": 1}), json!({"value": 2}), json!({"value": 3})],
                )
                .with_options(options(json!({"operation": "sum"}))),
            )
            .unwrap();

        let job = wait_until_done(&tracker, receipt.job_id).await;
        assert_eq!(job.result, Some(vec![json!({"value": 3}), json!({"value": 3})]));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_completes_immediately() {
        let tracker = tracker(ProcessingConfig::default());
        let receipt = tracker
            .submit(ProcessRequest::new(ProcessingType::Validate, vec![]))
            .unwrap();

        let job = wait_until_done(&tracker, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(vec![]));
        assert_eq!(job.total_items, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn jobs_are_listed_newest_first() {
        let tracker = tracker(ProcessingConfig::default());
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(
                tracker
                    .submit(ProcessRequest::new(ProcessingType::Filter, items(1)))
                    .unwrap()
                    .job_id,
            );
        }
        ids.reverse();

        let listed: Vec<JobId> = tracker.jobs().unwrap().into_iter().map(|j| j.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let tracker = tracker(ProcessingConfig::default());
        assert!(tracker.job(&JobId::new().to_string()).unwrap().is_none());
        assert!(tracker.job("not-a-job-id").unwrap().is_none());
    }

    /// Counts progress writes on top of the in-memory store.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryJobStore,
        progress_updates: AtomicUsize,
        last_seen: std::sync::Mutex<Vec<usize>>,
    }

    impl JobStore for RecordingStore {
        fn insert(&self, job: Job) -> Result<JobId, JobStoreError> {
            self.inner.insert(job)
        }

        fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
            self.inner.get(id)
        }

        fn record_progress(&self, id: JobId, items_processed: usize) -> Result<(), JobStoreError> {
            self.progress_updates.fetch_add(1, Ordering::SeqCst);
            self.last_seen.lock().unwrap().push(items_processed);
            self.inner.record_progress(id, items_processed)
        }

        fn complete(&self, id: JobId, result: Vec<Value>, duration: Duration) -> Result<Job, JobStoreError> {
            self.inner.complete(id, result, duration)
        }

        fn fail(&self, id: JobId, error: String) -> Result<Job, JobStoreError> {
            self.inner.fail(id, error)
        }

        fn list(&self) -> Result<Vec<Job>, JobStoreError> {
            self.inner.list()
        }

        fn stats(&self) -> Result<StatsSnapshot, JobStoreError> {
            self.inner.stats()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_written_once_per_chunk() {
        let store = Arc::new(RecordingStore::default());
        let tracker = JobTracker::new(Arc::clone(&store), ProcessingConfig::default().with_batch_size(100));
        let receipt = tracker
            .submit(ProcessRequest::new(ProcessingType::Validate, items(250)))
            .unwrap();
        wait_until_done(&tracker, receipt.job_id).await;

        assert_eq!(store.progress_updates.load(Ordering::SeqCst), 3);
        assert_eq!(*store.last_seen.lock().unwrap(), vec![100, 200, 250]);
    }

    proptest! {
        #[test]
        fn progress_marks_are_monotone_and_reach_total(total in 0usize..2_000, batch in 1usize..300) {
            let chunks = total.div_ceil(batch);
            let marks: Vec<usize> = (0..chunks).map(|i| progress_after(i, batch, total)).collect();

            prop_assert_eq!(marks.len(), chunks);
            prop_assert!(marks.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(marks.iter().all(|&m| m <= total));
            if total > 0 {
                prop_assert_eq!(marks.last().copied(), Some(total));
            }
        }

        #[test]
        fn job_progress_never_regresses(updates in proptest::collection::vec(0usize..500, 0..40)) {
            let mut job = Job::new(ProcessingType::Transform, 300, 3);
            let mut previous = 0;
            for n in updates {
                job.record_progress(n).unwrap();
                prop_assert!(job.items_processed >= previous);
                prop_assert!(job.items_processed <= job.total_items);
                previous = job.items_processed;
            }
        }
    }
}
