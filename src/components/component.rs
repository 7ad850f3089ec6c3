//! # Supervised component.
//!
//! A [`Component`] is restarted forever by its supervision loop:
//!
//! ```text
//! loop {
//!     start(ctx)   ── Ok  ──► restart immediately
//!                  └─ Err ──► report, back-off
//!     stop()       (always, even when start() failed or was cancelled)
//! }
//! ```
//!
//! `start()` returning `Ok(())` means "restart me". Setup-only components do their
//! work and then park on `ctx.cancelled().await`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ComponentError;

/// # Supervised, cancelable unit.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use panelvisor::{Component, ComponentError};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Component for Heartbeat {
///     async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
///         loop {
///             tokio::select! {
///                 _ = ctx.cancelled() => return Err(ComponentError::Canceled),
///                 _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Runs until `ctx` is cancelled or something goes wrong.
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError>;

    /// Best-effort teardown after every `start()` attempt.
    ///
    /// Must tolerate being called when `start()` bailed out early. Errors are
    /// reported and otherwise ignored.
    async fn stop(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Shared handle to a component.
pub type ComponentRef = Arc<dyn Component>;
