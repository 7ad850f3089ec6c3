//! # Report subscriber trait.
//!
//! [`Subscribe`] is the extension point of the diagnostics sink: crash counters,
//! an on-device error screen, or a remote syslog forwarder all implement it.
//!
//! Each subscriber gets:
//! - a **dedicated worker task**,
//! - a **bounded queue** (capacity via [`Subscribe::queue_capacity`]),
//! - **panic isolation** (a panicking subscriber loses that report only).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use panelvisor::{Report, ReportKind, Subscribe};
//!
//! #[derive(Default)]
//! struct CrashCounter(AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for CrashCounter {
//!     async fn on_report(&self, report: &Report) {
//!         if report.kind == ReportKind::AttemptFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "crash-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::diagnostics::Report;

/// Consumer of supervision reports.
///
/// ### Implementation requirements
/// - Do not block the executor; the runtime is cooperative.
/// - Handle errors internally.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single report, in FIFO order per subscriber.
    async fn on_report(&self, report: &Report);

    /// Name used when the runtime logs about this subscriber.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity; clamped to at least 1. Reports beyond it are dropped for this subscriber.
    fn queue_capacity(&self) -> usize {
        256
    }
}
