//! # Supervision reports.
//!
//! A [`Report`] describes one thing that happened to a supervised component:
//! creation at boot, the start and end of each `start()` attempt, teardown
//! failures, scheduled restarts, and the shutdown sequence.
//!
//! ## Ordering
//! Reports carry a process-wide `seq` that increases monotonically; subscribers
//! that receive reports through different queues can restore the order with it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for reports.
static REPORT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervision reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// A factory returned an instance that was added to the registry.
    ///
    /// Sets `component`, `priority`.
    ComponentCreated,

    /// A factory opted out by returning `None`.
    ///
    /// Sets `component`, `priority`.
    ComponentSkipped,

    /// `start()` is about to be called.
    ///
    /// Sets `component`, `attempt`.
    AttemptStarting,

    /// `start()` returned `Ok` (or unwound after cancellation); the component restarts at once.
    ///
    /// Sets `component`, `attempt`.
    AttemptExited,

    /// `start()` failed, panicked or timed out.
    ///
    /// Sets `component`, `attempt`, `reason`.
    AttemptFailed,

    /// `stop()` failed or panicked; the failure is otherwise ignored.
    ///
    /// Sets `component`, `attempt`, `reason`.
    StopFailed,

    /// The next attempt waits for a back-off.
    ///
    /// Sets `component`, `attempt` (the failed one), `delay`, `reason`.
    BackoffScheduled,

    /// Shutdown was requested (OS signal or [`Supervisor::shutdown`](crate::Supervisor::shutdown)).
    ShutdownRequested,

    /// Every component unwound within the grace period.
    AllStoppedWithin,

    /// The grace period ran out.
    ///
    /// Sets `reason` (stuck component names).
    GraceExceeded,
}

/// One supervision report.
#[derive(Debug, Clone)]
pub struct Report {
    /// Monotonic global sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Classification.
    pub kind: ReportKind,
    /// Registry name of the component.
    pub component: Option<Arc<str>>,
    /// Attempt number (1-based, per component, never reset).
    pub attempt: Option<u64>,
    /// Creation priority.
    pub priority: Option<i32>,
    /// Back-off before the next attempt.
    pub delay: Option<Duration>,
    /// Human-readable failure description.
    pub reason: Option<Arc<str>>,
}

impl Report {
    /// Creates a report of `kind` stamped with the current time and the next sequence number.
    pub fn now(kind: ReportKind) -> Self {
        Self {
            seq: REPORT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            attempt: None,
            priority: None,
            delay: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_component(mut self, name: impl Into<Arc<str>>) -> Self {
        self.component = Some(name.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, attempt: u64) -> Self {
        self.attempt = Some(attempt);
        self
    }

    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for reports describing a failure of some component call.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            ReportKind::AttemptFailed | ReportKind::StopFailed | ReportKind::GraceExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Report::now(ReportKind::AttemptStarting);
        let b = Report::now(ReportKind::AttemptExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builder_fields() {
        let r = Report::now(ReportKind::BackoffScheduled)
            .with_component("clock")
            .with_attempt(3)
            .with_delay(Duration::from_secs(1))
            .with_reason("boom");
        assert_eq!(r.component.as_deref(), Some("clock"));
        assert_eq!(r.attempt, Some(3));
        assert_eq!(r.delay, Some(Duration::from_secs(1)));
        assert_eq!(r.reason.as_deref(), Some("boom"));
        assert!(!r.is_failure());
        assert!(Report::now(ReportKind::StopFailed).is_failure());
    }
}
