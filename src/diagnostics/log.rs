//! # Logging subscriber.
//!
//! [`LogWriter`] turns reports into `tracing` events under the `panelvisor` target:
//! failures at `warn`, lifecycle noise at `debug`.

use async_trait::async_trait;

use crate::diagnostics::{Report, ReportKind, Subscribe};

/// Renders reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_report(&self, r: &Report) {
        let component = r.component.as_deref().unwrap_or("-");
        let reason = r.reason.as_deref().unwrap_or("");
        match r.kind {
            ReportKind::ComponentCreated => {
                tracing::info!(target: "panelvisor", component, priority = r.priority, "created");
            }
            ReportKind::ComponentSkipped => {
                tracing::info!(target: "panelvisor", component, priority = r.priority, "skipped by factory");
            }
            ReportKind::AttemptStarting => {
                tracing::debug!(target: "panelvisor", component, attempt = r.attempt, "starting");
            }
            ReportKind::AttemptExited => {
                tracing::debug!(target: "panelvisor", component, attempt = r.attempt, "exited, restarting");
            }
            ReportKind::AttemptFailed => {
                tracing::warn!(target: "panelvisor", component, attempt = r.attempt, reason, "start failed");
            }
            ReportKind::StopFailed => {
                tracing::warn!(target: "panelvisor", component, attempt = r.attempt, reason, "stop failed");
            }
            ReportKind::BackoffScheduled => {
                tracing::debug!(target: "panelvisor", component, attempt = r.attempt, delay = ?r.delay, "backoff");
            }
            ReportKind::ShutdownRequested => {
                tracing::info!(target: "panelvisor", "shutdown requested");
            }
            ReportKind::AllStoppedWithin => {
                tracing::info!(target: "panelvisor", "all components stopped within grace");
            }
            ReportKind::GraceExceeded => {
                tracing::error!(target: "panelvisor", stuck = reason, "grace exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
