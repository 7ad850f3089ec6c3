//! # Pull stream over one topic.
//!
//! A [`Stream`] is the queue half and the cancel half of a pull subscription in one
//! value: [`Stream::get`] awaits the next event in publish order, and cancelling
//! (explicitly or by dropping the stream) deregisters it from the bus.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;

use crate::bus::Event;
use crate::bus::event_bus::Shared;

/// FIFO subscription to one topic.
pub struct Stream {
    topic: Arc<str>,
    id: u64,
    rx: mpsc::UnboundedReceiver<Event>,
    bus: Weak<Shared>,
}

impl Stream {
    pub(crate) fn new(
        topic: Arc<str>,
        id: u64,
        rx: mpsc::UnboundedReceiver<Event>,
        bus: Weak<Shared>,
    ) -> Self {
        Self { topic, id, rx, bus }
    }

    /// Next event, in publish order. `None` once the bus is gone and the queue is drained.
    ///
    /// Cancel-safe: dropping the future loses no event.
    pub async fn get(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Next already-queued event, without waiting.
    pub fn try_get(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Topic this stream listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Deregisters the stream. Queued events are discarded.
    pub fn cancel(self) {}
}

impl Drop for Stream {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove_stream(&self.topic, self.id);
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::EventBus;

    #[tokio::test]
    async fn test_fifo_order() {
        let bus = EventBus::new();
        let mut s = bus.stream("t");
        for n in 1..=3u8 {
            bus.publish("t", n);
        }
        for n in 1..=3u8 {
            assert_eq!(s.get().await.unwrap().data::<u8>(), Some(&n));
        }
        assert!(s.try_get().is_none());
    }

    #[tokio::test]
    async fn test_cancel_deregisters() {
        let bus = EventBus::new();
        let s = bus.stream("t");
        let _other = bus.stream("t");
        assert_eq!(bus.subscriber_count("t"), 2);
        s.cancel();
        assert_eq!(bus.subscriber_count("t"), 1);
        assert_eq!(bus.publish("t", ()), 1);
    }

    #[tokio::test]
    async fn test_stream_ends_when_bus_is_dropped() {
        let bus = EventBus::new();
        let mut s = bus.stream("t");
        bus.publish("t", 7u8);
        drop(bus);
        assert_eq!(s.get().await.unwrap().data::<u8>(), Some(&7));
        assert!(s.get().await.is_none());
    }
}
