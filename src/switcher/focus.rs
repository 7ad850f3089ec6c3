//! # Focus requests.
//!
//! Any component can preempt the round-robin by publishing a [`FocusRequest`]
//! on [`FOCUS_TOPIC`]:
//!
//! ```rust
//! use std::time::Duration;
//! use panelvisor::{EventBus, FocusRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new();
//! bus.request_focus(FocusRequest::service("doorbell").with_hold(Duration::from_secs(30)));
//! # }
//! ```
//!
//! ## Resolution
//! - an explicit `instance` wins over a `service` name;
//! - a `service` is looked up as a display in the registry;
//! - `hold` defaults to the switcher dwell time;
//! - anything else on the topic (other payloads, unknown names) is unresolvable.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::Event;
use crate::components::Activatable;
use crate::registry::Registry;

/// Reserved bus topic for focus requests.
pub const FOCUS_TOPIC: &str = "focus.request";

/// Payload of a [`FOCUS_TOPIC`] event.
#[derive(Clone, Default)]
pub struct FocusRequest {
    /// Display to show, taking precedence over `service`.
    pub instance: Option<Arc<dyn Activatable>>,
    /// Registry name of the display to show.
    pub service: Option<String>,
    /// How long to keep the focus; `None` = the switcher dwell time.
    pub hold: Option<Duration>,
}

impl FocusRequest {
    /// Focus on a registered display.
    pub fn service(name: impl Into<String>) -> Self {
        Self {
            service: Some(name.into()),
            ..Self::default()
        }
    }

    /// Focus on a display instance (which need not be registered).
    pub fn instance(display: Arc<dyn Activatable>) -> Self {
        Self {
            instance: Some(display),
            ..Self::default()
        }
    }

    /// Sets the hold duration.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = Some(hold);
        self
    }
}

impl fmt::Debug for FocusRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusRequest")
            .field("instance", &self.instance.is_some())
            .field("service", &self.service)
            .field("hold", &self.hold)
            .finish()
    }
}

/// A resolved focus request.
pub(crate) struct FocusTarget {
    pub name: Arc<str>,
    pub display: Arc<dyn Activatable>,
    pub hold: Duration,
}

/// Resolves a focus event against the registry; `None` if it names nothing showable.
pub(crate) fn resolve(ev: &Event, registry: &Registry, default_hold: Duration) -> Option<FocusTarget> {
    let req = ev.data::<FocusRequest>()?;
    let hold = req.hold.unwrap_or(default_hold);

    if let Some(display) = &req.instance {
        let name = req.service.as_deref().unwrap_or("instance");
        return Some(FocusTarget {
            name: Arc::from(name),
            display: Arc::clone(display),
            hold,
        });
    }
    let name = req.service.as_deref()?;
    let display = registry.display(name)?;
    Some(FocusTarget {
        name: Arc::from(name),
        display,
        hold,
    })
}
