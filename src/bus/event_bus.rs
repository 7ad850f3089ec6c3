//! # Topic event bus.
//!
//! [`EventBus`] is a cheap-to-clone handle; every clone addresses the same topics.
//!
//! ## Rules
//! - `publish()` never blocks and never fails: callbacks run as independent tasks,
//!   streams are unbounded queues.
//! - A failing or panicking callback is logged; it affects neither the publisher
//!   nor other subscribers.
//! - Subscribers registered after a publish never see that event.
//! - Tokens are unique for the process and only serve unsubscription.
//! - Callbacks run on the runtime of the publisher, or else on the runtime the
//!   bus was created on, so a driver thread outside tokio can publish too.
//!
//! The bus is itself a component (priority 0) so that it exists before anything
//! that depends on it, see [`EventBus::descriptor`].

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::{Event, Stream};
use crate::components::{Component, ComponentDescriptor, Instance};
use crate::error::ComponentError;
use crate::registry::BUS;
use crate::switcher::{FOCUS_TOPIC, FocusRequest};

/// Source of subscription tokens and stream ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Opaque handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

type Callback = Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), ComponentError>> + Send + Sync>;

#[derive(Default)]
struct Topic {
    callbacks: Vec<(SubscriptionToken, Callback)>,
    streams: Vec<(u64, mpsc::UnboundedSender<Event>)>,
}

impl Topic {
    fn is_empty(&self) -> bool {
        self.callbacks.is_empty() && self.streams.is_empty()
    }
}

#[derive(Default)]
pub(crate) struct Topics {
    by_name: HashMap<Arc<str>, Topic>,
    tokens: HashMap<SubscriptionToken, Arc<str>>,
}

#[derive(Default)]
pub(crate) struct Shared {
    topics: Mutex<Topics>,
    runtime: Option<Handle>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Topics> {
        self.topics.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn remove_stream(&self, topic: &str, id: u64) {
        let mut topics = self.lock();
        if let Some(t) = topics.by_name.get_mut(topic) {
            t.streams.retain(|(sid, _)| *sid != id);
            if t.is_empty() {
                topics.by_name.remove(topic);
            }
        }
    }
}

/// Handle to the process event bus.
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates an empty bus bound to the current tokio runtime, if there is one.
    pub fn new() -> Self {
        Self::build(Handle::try_current().ok())
    }

    /// Creates an empty bus whose callbacks run on `runtime` when the publisher
    /// is not inside a runtime itself.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self::build(Some(runtime))
    }

    fn build(runtime: Option<Handle>) -> Self {
        Self {
            shared: Arc::new(Shared {
                topics: Mutex::default(),
                runtime,
            }),
        }
    }

    /// Descriptor registering a fresh bus under [`BUS`] at priority 0.
    pub fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new(BUS, 0, |_registry| {
            Ok(Some(Instance::component(Arc::new(EventBus::new()))))
        })
    }

    /// Publishes `data` on `topic`; returns how many subscribers it was handed to.
    pub fn publish<T>(&self, topic: &str, data: T) -> usize
    where
        T: std::any::Any + Send + Sync,
    {
        self.publish_event(Event::new(topic, data))
    }

    /// Publishes a prepared event.
    ///
    /// Streams receive it before this call returns; callbacks are spawned as tasks
    /// on the caller's runtime or the bus runtime. With neither they are skipped
    /// with a warning and not counted.
    pub fn publish_event(&self, event: Event) -> usize {
        let (callbacks, streams) = {
            let mut topics = self.shared.lock();
            let Some(topic) = topics.by_name.get_mut(event.topic()) else {
                return 0;
            };
            topic
                .streams
                .retain(|(_, tx)| tx.send(event.clone()).is_ok());
            (topic.callbacks.clone(), topic.streams.len())
        };

        if callbacks.is_empty() {
            return streams;
        }
        let Some(rt) = Handle::try_current()
            .ok()
            .or_else(|| self.shared.runtime.clone())
        else {
            tracing::warn!(topic = event.topic(), "no runtime; callbacks skipped");
            return streams;
        };

        let delivered = streams + callbacks.len();
        for (token, callback) in callbacks {
            let ev = event.clone();
            let topic = event.topic_arc();
            rt.spawn(async move {
                match AssertUnwindSafe(async move { callback(ev).await })
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(topic = %topic, token = token.0, error = %err, "bus callback failed");
                    }
                    Err(_) => {
                        tracing::warn!(topic = %topic, token = token.0, "bus callback panicked");
                    }
                }
            });
        }
        delivered
    }

    /// Asks the display switcher for the screen, see [`FocusRequest`].
    pub fn request_focus(&self, request: FocusRequest) -> usize {
        self.publish(FOCUS_TOPIC, request)
    }

    /// Registers a callback for `topic`.
    ///
    /// Every matching publish runs `f(event)` as its own task.
    pub fn subscribe<F, Fut>(&self, topic: &str, f: F) -> SubscriptionToken
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
    {
        let token = SubscriptionToken(next_id());
        let callback: Callback = Arc::new(move |ev| f(ev).boxed());
        let topic: Arc<str> = Arc::from(topic);

        let mut topics = self.shared.lock();
        topics
            .by_name
            .entry(Arc::clone(&topic))
            .or_default()
            .callbacks
            .push((token, callback));
        topics.tokens.insert(token, topic);
        token
    }

    /// Removes exactly that subscription; returns `false` if it was already gone.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut topics = self.shared.lock();
        let Some(name) = topics.tokens.remove(&token) else {
            return false;
        };
        if let Some(topic) = topics.by_name.get_mut(&name) {
            topic.callbacks.retain(|(t, _)| *t != token);
            if topic.is_empty() {
                topics.by_name.remove(&name);
            }
        }
        true
    }

    /// Opens a pull stream on `topic`. It receives every event published while it lives.
    pub fn stream(&self, topic: &str) -> Stream {
        let id = next_id();
        let topic: Arc<str> = Arc::from(topic);
        let (tx, rx) = mpsc::unbounded_channel();

        self.shared
            .lock()
            .by_name
            .entry(Arc::clone(&topic))
            .or_default()
            .streams
            .push((id, tx));
        Stream::new(topic, id, rx, Arc::downgrade(&self.shared))
    }

    /// Waits for the next event on `topic`.
    pub async fn wait(&self, topic: &str) -> Option<Event> {
        self.wait_until(topic, |_| true).await
    }

    /// Waits for the next event on `topic` that satisfies `pred`.
    ///
    /// The temporary stream is deregistered however this future ends, including
    /// when the caller drops it.
    pub async fn wait_until<P>(&self, topic: &str, pred: P) -> Option<Event>
    where
        P: Fn(&Event) -> bool,
    {
        let mut stream = self.stream(topic);
        while let Some(ev) = stream.get().await {
            if pred(&ev) {
                return Some(ev);
            }
        }
        None
    }

    /// Number of live callbacks and streams on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.shared
            .lock()
            .by_name
            .get(topic)
            .map_or(0, |t| t.callbacks.len() + t.streams.len())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self.shared.lock();
        f.debug_struct("EventBus")
            .field("topics", &topics.by_name.len())
            .field("callbacks", &topics.tokens.len())
            .finish()
    }
}

/// The bus needs no background work; it parks until shutdown.
#[async_trait]
impl Component for EventBus {
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        ctx.cancelled().await;
        Err(ComponentError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish("nobody", 1u8), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let token = bus.subscribe("t", |_| async { Ok(()) });
        assert_eq!(bus.subscriber_count("t"), 1);
        assert!(bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));
        assert_eq!(bus.subscriber_count("t"), 0);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let bus = EventBus::new();
        let a = bus.subscribe("t", |_| async { Ok(()) });
        let b = bus.subscribe("u", |_| async { Ok(()) });
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_failing_callback_does_not_affect_others() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe("t", |_| async { Err(ComponentError::fail("nope")) });
        bus.subscribe("t", |ev: Event| async move {
            if ev.data::<()>().is_some() {
                panic!("callback bug");
            }
            Ok(())
        });
        let h = hits.clone();
        bus.subscribe("t", move |_| {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert_eq!(bus.publish("t", ()), 3);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.publish("t", ()), 3);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wait_until_filters_and_cleans_up() {
        let bus = EventBus::new();
        let waiter = tokio::spawn({
            let bus = bus.clone();
            async move { bus.wait_until("n", |ev| ev.data::<u32>() == Some(&3)).await }
        });
        while bus.subscriber_count("n") == 0 {
            tokio::task::yield_now().await;
        }
        for n in 1..=4u32 {
            bus.publish("n", n);
        }
        let ev = waiter.await.unwrap().unwrap();
        assert_eq!(ev.data::<u32>(), Some(&3));
        assert_eq!(bus.subscriber_count("n"), 0);
    }

    #[tokio::test]
    async fn test_cancelled_wait_leaks_nothing() {
        let bus = EventBus::new();
        let res = tokio::time::timeout(Duration::from_millis(5), bus.wait("never")).await;
        assert!(res.is_err());
        assert_eq!(bus.subscriber_count("never"), 0);
    }
}
