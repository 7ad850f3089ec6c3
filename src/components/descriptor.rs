//! # Component descriptors.
//!
//! Every component module exposes a [`ComponentDescriptor`]: a registry name, a
//! creation priority and a factory. The host assembles the list explicitly and
//! hands it to the [`SupervisorBuilder`](crate::SupervisorBuilder); nothing is
//! discovered at runtime.
//!
//! ## Rules
//! - Lower priority is created first; ties keep list order.
//! - A factory may look up anything created before it in the [`Registry`].
//! - A factory returns `Ok(None)` to opt out (e.g. hardware not present).
//! - A factory returns `Err` when a dependency is missing; boot aborts.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use panelvisor::{ComponentDescriptor, ComponentError, ComponentFn, Instance};
//!
//! let ntp = ComponentDescriptor::new("ntp", 1, |registry| {
//!     let _bus = registry.require_bus("ntp")?;
//!     let component = ComponentFn::arc(|ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, ComponentError>(())
//!     });
//!     Ok(Some(Instance::component(component)))
//! });
//! assert_eq!(ntp.priority(), 1);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::components::{Activatable, Component, ComponentRef};
use crate::error::RuntimeError;
use crate::policies::BackoffPolicy;
use crate::registry::Registry;

/// Factory signature: build an instance from what is already registered.
pub type Factory =
    Arc<dyn Fn(&Arc<Registry>) -> Result<Option<Instance>, RuntimeError> + Send + Sync>;

/// A live component as stored in the registry, viewed through each capability it has.
#[derive(Clone)]
pub struct Instance {
    pub(crate) value: Arc<dyn Any + Send + Sync>,
    pub(crate) component: ComponentRef,
    pub(crate) display: Option<Arc<dyn Activatable>>,
}

impl Instance {
    /// A plain supervised component.
    pub fn component<T: Component>(component: Arc<T>) -> Self {
        Self {
            value: component.clone(),
            component,
            display: None,
        }
    }

    /// A supervised component that can also own the display.
    pub fn display<T: Component + Activatable>(component: Arc<T>) -> Self {
        Self {
            value: component.clone(),
            display: Some(component.clone()),
            component,
        }
    }

    /// A supervised component whose display capability lives in a separate object
    /// (e.g. a [`Toggled`](crate::Toggled) adapter around it).
    pub fn with_display(mut self, display: Arc<dyn Activatable>) -> Self {
        self.display = Some(display);
        self
    }

    /// True if the instance can be scheduled by the display switcher.
    pub fn is_display(&self) -> bool {
        self.display.is_some()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("display", &self.is_display())
            .finish_non_exhaustive()
    }
}

/// Static `{name, priority, factory}` record plus per-component supervision overrides.
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: Cow<'static, str>,
    priority: i32,
    factory: Factory,
    backoff: Option<BackoffPolicy>,
    timeout: Option<Duration>,
}

impl ComponentDescriptor {
    /// Creates a descriptor.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, priority: i32, factory: F) -> Self
    where
        F: Fn(&Arc<Registry>) -> Result<Option<Instance>, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            factory: Arc::new(factory),
            backoff: None,
            timeout: None,
        }
    }

    /// Registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation priority (lower first).
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Restart back-off override; `None` uses `Config.supervisor.backoff`.
    pub fn backoff(&self) -> Option<BackoffPolicy> {
        self.backoff
    }

    /// Per-attempt timeout on `start()`; `None` = unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the descriptor with a back-off override.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Returns the descriptor with a per-attempt timeout (`0` = none).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Runs the factory.
    pub(crate) fn create(&self, registry: &Arc<Registry>) -> Result<Option<Instance>, RuntimeError> {
        (self.factory)(registry)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("backoff", &self.backoff)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
