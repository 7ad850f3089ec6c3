//! # Closure-backed component (`ComponentFn`)
//!
//! [`ComponentFn`] wraps `F: Fn(CancellationToken) -> Fut` and builds a fresh future
//! for every `start()`. Shared state between attempts must be captured explicitly
//! (e.g. an `Arc<AtomicUsize>`).
//!
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use panelvisor::{ComponentError, ComponentFn};
//!
//! let setup = ComponentFn::arc(|ctx: CancellationToken| async move {
//!     // one-time work...
//!     ctx.cancelled().await;
//!     Ok::<_, ComponentError>(())
//! });
//! # let _ = setup;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::components::Component;
use crate::error::ComponentError;

/// Function-backed component; `stop()` is a no-op.
#[derive(Debug)]
pub struct ComponentFn<F> {
    f: F,
}

impl<F> ComponentFn<F> {
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the closure and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Component for ComponentFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
{
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        (self.f)(ctx).await
    }
}
