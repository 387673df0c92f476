//! Batch-processing job tracker.
//!
//! ## Design
//!
//! - A submission creates a job in `processing` state and returns at once
//! - Each job runs in its own tokio task; chunks inside a job run in order
//! - Per-job wall-clock budget, checked before every chunk
//! - No retries: the first error fails the job
//! - Jobs and aggregate stats live in memory for the life of the process
//!
//! ## Components
//!
//! - `Job`: tracked lifecycle of one request
//! - `JobStore`: owner of the job map and the stats counters
//! - `ChunkProcessor`: per-type transform applied to each chunk
//! - `JobTracker`: submission, execution and queries

pub mod executor;
pub mod processors;
pub mod store;
pub mod types;

pub use executor::{JobTracker, ProcessingConfig, SubmitError};
pub use processors::{AggregateOp, ChunkProcessor, ProcessingError};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use types::{
    Job, JobId, JobStatus, ProcessRequest, ProcessingStats, ProcessingType, StatsSnapshot,
    SubmitReceipt, TerminalJobError,
};
