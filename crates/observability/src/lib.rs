//! Tracing and logging setup shared by both services.

/// Tracing configuration (filters, formatters, file output).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings, ParseLogFormatError};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops. Keep the
/// returned guard alive for the life of the process when file output is
/// enabled, otherwise buffered lines are lost on exit.
pub fn init(settings: &LogSettings) -> Option<WorkerGuard> {
    crate::tracing::init(settings)
}
