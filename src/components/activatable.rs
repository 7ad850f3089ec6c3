//! # Display capability.
//!
//! Components that render to the shared display implement [`Activatable`] in
//! addition to [`Component`](crate::Component). The [`DisplaySwitcher`](crate::DisplaySwitcher)
//! calls [`Activatable::activate`] when the display is theirs and cancels the
//! context when it takes the display away; at most one activation runs at any time.
//!
//! Older displays that only understand an on/off switch implement [`Toggle`]
//! and are registered through [`Toggled`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ComponentError;

/// A component that can own the display.
#[async_trait]
pub trait Activatable: Send + Sync + 'static {
    /// Whether the display wants its round-robin turn right now
    /// (e.g. an alert screen with nothing to alert about returns `false`).
    ///
    /// Focus requests ignore this gate.
    fn should_activate(&self) -> bool {
        true
    }

    /// Renders until `ctx` is cancelled.
    ///
    /// Returning early (with or without an error) simply leaves the display idle
    /// until the switcher moves on.
    async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError>;
}

/// A display driven by an on/off switch instead of an owned activation.
#[async_trait]
pub trait Toggle: Send + Sync + 'static {
    /// See [`Activatable::should_activate`].
    fn should_activate(&self) -> bool {
        true
    }

    /// Turns rendering on or off.
    async fn set_active(&self, active: bool);
}

/// Adapts a [`Toggle`] display to [`Activatable`]:
/// `set_active(true)`, hold until cancelled, `set_active(false)`.
pub struct Toggled<T>(pub Arc<T>);

impl<T> Toggled<T> {
    /// Wraps a toggle display.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

#[async_trait]
impl<T: Toggle> Activatable for Toggled<T> {
    fn should_activate(&self) -> bool {
        self.0.should_activate()
    }

    async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        self.0.set_active(true).await;
        ctx.cancelled().await;
        self.0.set_active(false).await;
        Err(ComponentError::Canceled)
    }
}
