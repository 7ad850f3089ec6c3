//! # Bus event.
//!
//! An [`Event`] is created once per `publish()` and shared (cheap clones) with every
//! subscriber. The payload is opaque to the bus; consumers downcast it.
//!
//! ```rust
//! use panelvisor::Event;
//!
//! let ev = Event::new("sensor.temperature", 21.5_f32);
//! assert_eq!(ev.topic(), "sensor.temperature");
//! assert_eq!(ev.data::<f32>(), Some(&21.5));
//! assert!(ev.data::<String>().is_none());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Immutable published record.
#[derive(Clone)]
pub struct Event {
    seq: u64,
    at: SystemTime,
    topic: Arc<str>,
    data: Arc<dyn Any + Send + Sync>,
}

impl Event {
    /// Creates an event stamped with the current time and the next sequence number.
    pub fn new<T: Any + Send + Sync>(topic: impl Into<Arc<str>>, data: T) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            topic: topic.into(),
            data: Arc::new(data),
        }
    }

    /// Topic the event was published on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub(crate) fn topic_arc(&self) -> Arc<str> {
        Arc::clone(&self.topic)
    }

    /// Payload as `T`, if it is one.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Publish timestamp.
    pub fn at(&self) -> SystemTime {
        self.at
    }

    /// Process-wide monotonic sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("topic", &self.topic)
            .field("at", &self.at)
            .finish_non_exhaustive()
    }
}
