use std::any::Any;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{boot, supervisor::Supervisor};
use crate::components::ComponentDescriptor;
use crate::config::Config;
use crate::diagnostics::{LogWriter, Subscribe, SubscriberSet};
use crate::error::RuntimeError;
use crate::registry::Registry;

type ValueInit = Box<dyn FnOnce(&Registry) -> Result<(), RuntimeError> + Send>;

/// Builder for constructing a [`Supervisor`] from an explicit component list.
pub struct SupervisorBuilder {
    cfg: Config,
    descriptors: Vec<ComponentDescriptor>,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
    values: Vec<ValueInit>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            descriptors: Vec::new(),
            subscribers: None,
            values: Vec::new(),
        }
    }

    /// Adds one component descriptor.
    pub fn with_component(mut self, descriptor: ComponentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Adds several component descriptors, keeping their order.
    pub fn with_components(mut self, descriptors: impl IntoIterator<Item = ComponentDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Sets report subscribers, replacing the default [`LogWriter`].
    ///
    /// Pass an empty list to silence reports entirely.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Adds one report subscriber next to the ones already configured.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers
            .get_or_insert_with(|| vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
            .push(subscriber);
        self
    }

    /// Registers a process-wide singleton before any component is created.
    pub fn with_value<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: Arc<T>) -> Self {
        let name = name.into();
        self.values
            .push(Box::new(move |registry: &Registry| registry.insert_value(name, value)));
        self
    }

    /// Validates the config, creates every component in priority order and
    /// returns a supervisor ready to [`run`](Supervisor::run).
    ///
    /// Must be called inside a tokio runtime (report workers are spawned here).
    /// Any boot error aborts: nothing is started.
    pub fn build(self) -> Result<Supervisor, RuntimeError> {
        self.cfg.validate()?;

        let subscribers = self
            .subscribers
            .unwrap_or_else(|| vec![Arc::new(LogWriter) as Arc<dyn Subscribe>]);
        let subs = Arc::new(SubscriberSet::new(subscribers));
        let registry = Registry::new(self.cfg);

        for init in self.values {
            init(registry.as_ref())?;
        }
        let supervised = boot::instantiate(self.descriptors, &registry, &subs)?;

        Ok(Supervisor::new_internal(
            registry,
            subs,
            supervised,
            CancellationToken::new(),
        ))
    }
}
