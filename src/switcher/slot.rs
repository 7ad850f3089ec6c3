//! # The display slot.
//!
//! [`ActiveSlot`] holds the single in-flight `activate()` task. Handing the
//! display over is always cancel → join → start:
//!
//! ```text
//! replace(next):
//!   current.token.cancel()
//!   join(current)            (up to `unwind`, then abort + join)
//!   spawn(next.activate(child token))
//! ```
//!
//! Since `replace` and `clear` take `&mut self` and only return once the old task
//! is gone, two activations never overlap.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::components::Activatable;
use crate::error::ComponentError;

struct Activation {
    name: Arc<str>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// At most one running activation.
pub(crate) struct ActiveSlot {
    current: Option<Activation>,
    unwind: Duration,
}

impl ActiveSlot {
    pub fn new(unwind: Duration) -> Self {
        Self {
            current: None,
            unwind,
        }
    }

    /// Name of the display currently holding the slot.
    #[cfg(test)]
    pub fn name(&self) -> Option<&Arc<str>> {
        self.current.as_ref().map(|a| &a.name)
    }

    /// Stops the current activation (if any) and starts `display` under a child of `parent`.
    pub async fn replace(&mut self, name: Arc<str>, display: Arc<dyn Activatable>, parent: &CancellationToken) {
        self.clear().await;

        let token = parent.child_token();
        let ctx = token.clone();
        let task_name = Arc::clone(&name);
        let handle = tokio::spawn(async move {
            let res = AssertUnwindSafe(display.activate(ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(ComponentError::from_panic(panic)));
            match res {
                Ok(()) => tracing::debug!(target: "panelvisor::switcher", display = %task_name, "activation returned"),
                Err(e) if e.is_cancellation() => {}
                Err(e) => {
                    tracing::warn!(target: "panelvisor::switcher", display = %task_name, error = %e, "activation failed")
                }
            }
        });
        self.current = Some(Activation { name, token, handle });
    }

    /// Cancels the current activation and waits until it is gone.
    pub async fn clear(&mut self) {
        let Some(Activation {
            name,
            token,
            mut handle,
        }) = self.current.take()
        else {
            return;
        };
        token.cancel();
        if tokio::time::timeout(self.unwind, &mut handle).await.is_err() {
            tracing::warn!(
                target: "panelvisor::switcher",
                display = %name,
                unwind = ?self.unwind,
                "activation ignored cancellation; aborting"
            );
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        if let Some(a) = self.current.take() {
            a.token.cancel();
            a.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Tracks how many activations are live and the highest count seen.
    #[derive(Default)]
    struct Gauge {
        live: AtomicUsize,
        peak: AtomicUsize,
    }

    struct Screen(Arc<Gauge>);

    #[async_trait]
    impl Activatable for Screen {
        async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
            let now = self.0.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.0.peak.fetch_max(now, Ordering::SeqCst);
            ctx.cancelled().await;
            // Unwinding takes a while; the next activation must wait for it.
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.live.fetch_sub(1, Ordering::SeqCst);
            Err(ComponentError::Canceled)
        }
    }

    struct Stubborn;

    #[async_trait]
    impl Activatable for Stubborn {
        async fn activate(&self, _ctx: CancellationToken) -> Result<(), ComponentError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_waits_for_previous_unwind() {
        let gauge = Arc::new(Gauge::default());
        let parent = CancellationToken::new();
        let mut slot = ActiveSlot::new(Duration::from_secs(1));

        for name in ["a", "b", "c"] {
            slot.replace(Arc::from(name), Arc::new(Screen(gauge.clone())), &parent).await;
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(slot.name().map(|n| &**n), Some(name));
        }
        slot.clear().await;

        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
        assert_eq!(gauge.live.load(Ordering::SeqCst), 0);
        assert!(slot.name().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stubborn_activation_is_aborted() {
        let parent = CancellationToken::new();
        let mut slot = ActiveSlot::new(Duration::from_millis(100));
        slot.replace(Arc::from("stubborn"), Arc::new(Stubborn), &parent).await;

        let started = tokio::time::Instant::now();
        slot.clear().await;
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(slot.name().is_none());
    }
}
