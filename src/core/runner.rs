//! # One supervised attempt.
//!
//! ```text
//! start(child_token) ──► Ok / Err(Canceled) ──► AttemptExited
//!   (optional timeout)   Err / panic / timeout ─► AttemptFailed
//! child_token.cancel()   (anything start() left behind unwinds)
//! stop()             ──► Err / panic ──► StopFailed (otherwise ignored)
//! ```
//!
//! ## Rules
//! - `stop()` runs after **every** attempt, whatever `start()` did.
//! - A panic in `start()` becomes [`ComponentError::Panicked`]; a panic in `stop()` is reported and dropped.
//! - Each attempt gets its own child token; cancelling it never affects the parent.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::components::Component;
use crate::diagnostics::{Report, ReportKind, SubscriberSet};
use crate::error::ComponentError;

/// Runs `start()` once, then `stop()`, and reports the outcome.
pub(crate) async fn run_once(
    name: &str,
    component: &dyn Component,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    attempt: u64,
    subs: &SubscriberSet,
) -> Result<(), ComponentError> {
    let child = parent.child_token();
    let start = AssertUnwindSafe(component.start(child.clone()))
        .catch_unwind()
        .map(|r| r.unwrap_or_else(|panic| Err(ComponentError::from_panic(panic))));

    let res = match timeout {
        Some(dur) => tokio::time::timeout(dur, start)
            .await
            .unwrap_or(Err(ComponentError::Timeout { timeout: dur })),
        None => start.await,
    };
    child.cancel();

    let stop = AssertUnwindSafe(component.stop())
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ComponentError::from_panic(panic)));
    if let Err(e) = stop {
        subs.emit(
            Report::now(ReportKind::StopFailed)
                .with_component(name)
                .with_attempt(attempt)
                .with_reason(e.to_string()),
        );
    }

    match &res {
        Ok(()) | Err(ComponentError::Canceled) => subs.emit(
            Report::now(ReportKind::AttemptExited)
                .with_component(name)
                .with_attempt(attempt),
        ),
        Err(e) => subs.emit(
            Report::now(ReportKind::AttemptFailed)
                .with_component(name)
                .with_attempt(attempt)
                .with_reason(e.to_string()),
        ),
    }
    res
}
