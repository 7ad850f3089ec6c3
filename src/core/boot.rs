//! # Boot: descriptors → registry.
//!
//! ```text
//! descriptors ──► stable sort by priority
//!   for each d:
//!     d.create(registry)            (panic → CreateFailed)
//!       ├─ Err(e)         ──► abort boot with e
//!       ├─ Ok(None)       ──► ComponentSkipped
//!       └─ Ok(Some(inst)) ──► registry.insert(d.name, inst) ──► ComponentCreated
//! ```
//!
//! The result is the list of components to supervise, in creation order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::components::{ComponentDescriptor, ComponentRef};
use crate::config::Config;
use crate::core::actor::ActorParams;
use crate::diagnostics::{Report, ReportKind, SubscriberSet};
use crate::error::{ComponentError, RuntimeError};
use crate::registry::Registry;

/// A created component waiting to be supervised.
#[derive(Clone)]
pub(crate) struct Supervised {
    pub name: Arc<str>,
    pub component: ComponentRef,
    pub params: ActorParams,
}

/// Creates every descriptor in priority order and registers the results.
pub(crate) fn instantiate(
    mut descriptors: Vec<ComponentDescriptor>,
    registry: &Arc<Registry>,
    subs: &SubscriberSet,
) -> Result<Vec<Supervised>, RuntimeError> {
    descriptors.sort_by_key(ComponentDescriptor::priority);
    let defaults = defaults(registry.config());

    let mut supervised = Vec::with_capacity(descriptors.len());
    for d in descriptors {
        let name: Arc<str> = Arc::from(d.name());
        let created = catch_unwind(AssertUnwindSafe(|| d.create(registry))).unwrap_or_else(|panic| {
            Err(RuntimeError::CreateFailed {
                component: name.to_string(),
                reason: ComponentError::from_panic(panic).to_string(),
            })
        })?;

        let Some(instance) = created else {
            subs.emit(
                Report::now(ReportKind::ComponentSkipped)
                    .with_component(Arc::clone(&name))
                    .with_priority(d.priority()),
            );
            continue;
        };

        let component = Arc::clone(&instance.component);
        registry.insert(name.as_ref(), instance)?;
        subs.emit(
            Report::now(ReportKind::ComponentCreated)
                .with_component(Arc::clone(&name))
                .with_priority(d.priority()),
        );

        supervised.push(Supervised {
            name,
            component,
            params: ActorParams {
                backoff: d.backoff().unwrap_or(defaults.backoff),
                timeout: d.timeout(),
            },
        });
    }
    Ok(supervised)
}

fn defaults(cfg: &Config) -> ActorParams {
    ActorParams {
        backoff: cfg.supervisor.backoff,
        timeout: None,
    }
}
