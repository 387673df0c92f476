//! Core job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use meridian_core::{DomainError, DomainResult};

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

meridian_core::impl_uuid_newtype!(JobId, "JobId");

/// Kind of processing applied to every chunk of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingType {
    Transform,
    Validate,
    Aggregate,
    Filter,
}

impl ProcessingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingType::Transform => "transform",
            ProcessingType::Validate => "validate",
            ProcessingType::Aggregate => "aggregate",
            ProcessingType::Filter => "filter",
        }
    }
}

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted and running
    Processing,
    /// All chunks processed
    Completed,
    /// Timed out or hit a processing error
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempt to change a job that already reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job {id} is already {status}")]
pub struct TerminalJobError {
    pub id: JobId,
    pub status: JobStatus,
}

/// Submission payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessRequest {
    #[serde(rename = "type")]
    pub kind: ProcessingType,
    pub data: Vec<Value>,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
    /// Advisory 1–5; recorded on the job, never used for ordering.
    #[serde(default)]
    pub priority: Option<u8>,
}

pub const DEFAULT_PRIORITY: u8 = 3;

impl ProcessRequest {
    pub fn new(kind: ProcessingType, data: Vec<Value>) -> Self {
        Self {
            kind,
            data,
            options: None,
            priority: None,
        }
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        match self.priority {
            Some(p) if !(1..=5).contains(&p) => Err(DomainError::validation(format!(
                "priority must be between 1 and 5, got {p}"
            ))),
            _ => Ok(()),
        }
    }

    pub fn effective_priority(&self) -> u8 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

/// Response to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub status: &'static str,
}

impl SubmitReceipt {
    pub fn accepted(job_id: JobId) -> Self {
        Self {
            job_id,
            status: "accepted",
        }
    }
}

/// A tracked batch-processing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(rename = "type")]
    pub kind: ProcessingType,
    pub items_processed: usize,
    pub total_items: usize,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only on `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Value>>,
    /// Set only on `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    pub fn new(kind: ProcessingType, total_items: usize, priority: u8) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Processing,
            kind,
            items_processed: 0,
            total_items,
            priority,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
        }
    }

    fn ensure_open(&self) -> Result<(), TerminalJobError> {
        if self.status.is_terminal() {
            return Err(TerminalJobError {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Record progress. Clamped to `total_items`; never moves backwards.
    pub fn record_progress(&mut self, items_processed: usize) -> Result<(), TerminalJobError> {
        self.ensure_open()?;
        self.items_processed = self.items_processed.max(items_processed.min(self.total_items));
        Ok(())
    }

    /// Mark job as completed.
    pub fn mark_completed(&mut self, result: Vec<Value>, at: DateTime<Utc>) -> Result<(), TerminalJobError> {
        self.ensure_open()?;
        self.status = JobStatus::Completed;
        self.completed_at = Some(at);
        self.result = Some(result);
        Ok(())
    }

    /// Mark job as failed.
    pub fn mark_failed(&mut self, error: String, at: DateTime<Utc>) -> Result<(), TerminalJobError> {
        self.ensure_open()?;
        self.status = JobStatus::Failed;
        self.completed_at = Some(at);
        self.error = Some(error);
        Ok(())
    }
}

/// Process-wide counters over every job ever submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub total_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    /// Mean wall-clock duration of completed jobs, in milliseconds.
    pub average_processing_time: f64,
}

impl ProcessingStats {
    /// Count a completion and fold its duration into the running mean.
    pub fn record_completion(&mut self, duration_ms: f64) {
        self.completed_jobs += 1;
        self.average_processing_time +=
            (duration_ms - self.average_processing_time) / self.completed_jobs as f64;
    }

    pub fn record_failure(&mut self) {
        self.failed_jobs += 1;
    }
}

/// Stats view returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: ProcessingStats,
    pub active_jobs: usize,
    pub total_jobs_in_memory: usize,
}
