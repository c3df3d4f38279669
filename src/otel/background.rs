//! Internal job instrumentation.
//!
//! For multi-step work inside the process: schema discovery and plan
//! execution. Uses INTERNAL span kind.

use tracing::{field, span, Level, Span};

/// Internal job types.
#[derive(Debug, Clone, Copy)]
pub enum BackgroundJobType {
    /// Introspect + parse + graph build
    SchemaDiscovery,
    /// Sequential plan step execution
    PlanExecution,
}

impl BackgroundJobType {
    /// Get job type as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaDiscovery => "schema.discover",
            Self::PlanExecution => "plan.execute",
        }
    }
}

/// Create job span.
///
/// # Arguments
///
/// * `job_type` - Type of job
/// * `target` - Job target (database name, question id)
pub fn background_span(job_type: BackgroundJobType, target: &str) -> Span {
    span!(
        Level::INFO,
        "background.job",
        otel.name = %format!("{} {}", job_type.as_str(), target),
        otel.kind = "internal",
        job.type = job_type.as_str(),
        job.target = target,
        job.batch_size = field::Empty,
        job.duration_ms = field::Empty,
        job.status = field::Empty,
    )
}

/// Record job metrics on the current span.
///
/// # Arguments
///
/// * `batch_size` - Number of items produced or processed (optional)
/// * `duration_ms` - Processing duration in milliseconds (optional)
/// * `status` - Job status ("success", "failed", "partial")
pub fn record_background_metrics(
    batch_size: Option<usize>,
    duration_ms: Option<u64>,
    status: &str,
) {
    let span = Span::current();
    if let Some(size) = batch_size {
        span.record("job.batch_size", size);
    }
    if let Some(duration) = duration_ms {
        span.record("job.duration_ms", duration);
    }
    span.record("job.status", status);
}
