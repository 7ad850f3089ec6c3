//! # ComponentActor: the supervision loop of one component.
//!
//! ```text
//! loop {
//!   ├─► attempt += 1, report AttemptStarting
//!   ├─► run_once()  (start → stop)
//!   │     ├─ Ok / Canceled ─► failures = 0, yield, restart
//!   │     └─ Err ──────────► delay = backoff.next(failures), failures += 1
//!   │                        report BackoffScheduled, sleep(delay) (cancellable)
//!   └─ exit: runtime token cancelled (checked before and after each attempt, and during back-off)
//! }
//! ```
//!
//! ## Rules
//! - Attempts never overlap for one component.
//! - The attempt counter is monotonic for the life of the actor.
//! - The back-off grows only over *consecutive* failures.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::components::ComponentRef;
use crate::core::runner::run_once;
use crate::diagnostics::{Report, ReportKind, SubscriberSet};
use crate::error::ComponentError;
use crate::policies::BackoffPolicy;

/// Supervision parameters resolved at boot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ActorParams {
    /// Pause after failed attempts.
    pub backoff: BackoffPolicy,
    /// Optional per-attempt timeout on `start()`.
    pub timeout: Option<Duration>,
}

/// Restarts one component forever.
pub(crate) struct ComponentActor {
    pub name: Arc<str>,
    pub component: ComponentRef,
    pub params: ActorParams,
    pub subs: Arc<SubscriberSet>,
}

impl ComponentActor {
    /// Runs until `token` is cancelled; returns the component name for join accounting.
    pub async fn run(self, token: CancellationToken) -> Arc<str> {
        let mut attempt: u64 = 0;
        let mut failures: u32 = 0;

        while !token.is_cancelled() {
            attempt += 1;
            self.subs.emit(
                Report::now(ReportKind::AttemptStarting)
                    .with_component(Arc::clone(&self.name))
                    .with_attempt(attempt),
            );

            let res = run_once(
                &self.name,
                self.component.as_ref(),
                &token,
                self.params.timeout,
                attempt,
                &self.subs,
            )
            .await;
            if token.is_cancelled() {
                break;
            }

            match res {
                Ok(()) | Err(ComponentError::Canceled) => {
                    failures = 0;
                    // The finished attempt's state is released by now; let others run
                    // before a component that returns immediately comes back.
                    tokio::task::yield_now().await;
                }
                Err(e) => {
                    let delay = self.params.backoff.next(failures);
                    failures = failures.saturating_add(1);
                    self.subs.emit(
                        Report::now(ReportKind::BackoffScheduled)
                            .with_component(Arc::clone(&self.name))
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(e.to_string()),
                    );

                    tokio::select! {
                        _ = time::sleep(delay) => {}
                        _ = token.cancelled() => break,
                    }
                }
            }
        }
        self.name
    }
}
