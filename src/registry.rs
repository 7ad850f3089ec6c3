//! # Provider registry.
//!
//! The [`Registry`] maps unique names to live instances and carries the process
//! [`Config`]. It is filled in priority order during boot, so a factory can look
//! up everything created before it; after boot it is read concurrently and only
//! grows through late registrations. Entries are never replaced or removed.
//!
//! Components keep a [`Weak`](std::sync::Weak) reference when they need the
//! registry after creation: the registry owns them, not the other way round.
//!
//! ## Lookups
//! - [`Registry::get`] / [`Registry::require`]: typed (downcast) access
//! - [`Registry::component`] / [`Registry::display`]: capability access
//! - [`Registry::bus`] / [`Registry::require_bus`]: the event bus under [`BUS`]

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bus::EventBus;
use crate::components::{Activatable, ComponentRef, Instance};
use crate::config::Config;
use crate::error::RuntimeError;

/// Registry name of the event bus.
pub const BUS: &str = "bus";

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    component: Option<ComponentRef>,
    display: Option<Arc<dyn Activatable>>,
}

#[derive(Default)]
struct Entries {
    order: Vec<String>,
    map: HashMap<String, Entry>,
}

/// Name → instance map plus configuration.
pub struct Registry {
    config: Config,
    entries: RwLock<Entries>,
}

impl Registry {
    /// Creates an empty registry around `config`.
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            entries: RwLock::new(Entries::default()),
        })
    }

    /// Process configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers a component instance under `name`.
    pub fn insert(&self, name: impl Into<String>, instance: Instance) -> Result<(), RuntimeError> {
        self.put(
            name.into(),
            Entry {
                value: instance.value,
                component: Some(instance.component),
                display: instance.display,
            },
        )
    }

    /// Registers a process-wide singleton that is not a component (a network handle, a driver).
    pub fn insert_value<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        value: Arc<T>,
    ) -> Result<(), RuntimeError> {
        self.put(
            name.into(),
            Entry {
                value,
                component: None,
                display: None,
            },
        )
    }

    /// Typed lookup; `None` if absent or of another type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let value = self.read().map.get(name).map(|e| Arc::clone(&e.value))?;
        value.downcast::<T>().ok()
    }

    /// Typed lookup for factories: a missing or mistyped entry is a boot error of `requester`.
    pub fn require<T: Any + Send + Sync>(
        &self,
        requester: &str,
        name: &str,
    ) -> Result<Arc<T>, RuntimeError> {
        let value = self
            .read()
            .map
            .get(name)
            .map(|e| Arc::clone(&e.value))
            .ok_or_else(|| RuntimeError::MissingDependency {
                component: requester.to_string(),
                dependency: name.to_string(),
            })?;
        value
            .downcast::<T>()
            .map_err(|_| RuntimeError::DependencyType {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// The supervised view of `name`.
    pub fn component(&self, name: &str) -> Option<ComponentRef> {
        self.read().map.get(name).and_then(|e| e.component.clone())
    }

    /// The display view of `name`, if it has one.
    pub fn display(&self, name: &str) -> Option<Arc<dyn Activatable>> {
        self.read().map.get(name).and_then(|e| e.display.clone())
    }

    /// The event bus, if one was registered under [`BUS`].
    pub fn bus(&self) -> Option<EventBus> {
        self.get::<EventBus>(BUS).map(|bus| (*bus).clone())
    }

    /// The event bus, or a boot error of `requester`.
    pub fn require_bus(&self, requester: &str) -> Result<EventBus, RuntimeError> {
        self.require::<EventBus>(requester, BUS)
            .map(|bus| (*bus).clone())
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.read().map.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.read().order.clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put(&self, name: String, entry: Entry) -> Result<(), RuntimeError> {
        let mut entries = self.write();
        if entries.map.contains_key(&name) {
            return Err(RuntimeError::DuplicateName { name });
        }
        entries.order.push(name.clone());
        entries.map.insert(name, entry);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish_non_exhaustive()
    }
}
