//! Handler failure reporting.

use tracing::error;

/// Receives handler failures for observability. Purely observational:
/// nothing the sink does feeds back into scheduling decisions.
pub trait DiagnosticSink: Send + Sync {
    fn handler_failed(&self, job_name: &str, error: &str);
}

/// Default sink that logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn handler_failed(&self, job_name: &str, error: &str) {
        error!(name = %job_name, error = %error, "exception in cron handler");
    }
}
