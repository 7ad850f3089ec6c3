//! In-process topic publish/subscribe.
//!
//! ## Contents
//! - [`Event`] immutable `{topic, data, timestamp}` record
//! - [`EventBus`] topic registry with callback subscribers and pull streams
//! - [`Stream`] FIFO queue of one topic's events, deregistered on cancel/drop
//!
//! ```text
//! publish(topic, data)
//!     ├──► callback 1 ─► tokio::spawn (isolated, errors logged)
//!     ├──► callback N ─► tokio::spawn
//!     ├──► Stream A   ─► unbounded FIFO ─► a.get().await
//!     └──► Stream B   ─► unbounded FIFO ─► b.get().await
//! ```
//!
//! Delivery is at-most-once to whoever is subscribed at publish time; nothing is retained.

mod event;
mod event_bus;
mod stream;

pub use event::Event;
pub use event_bus::{EventBus, SubscriptionToken};
pub use stream::Stream;
