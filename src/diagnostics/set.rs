//! # SubscriberSet: non-blocking fan-out of reports.
//!
//! ## Guarantees
//! - `emit(Report)` returns immediately.
//! - Per-subscriber FIFO.
//! - A panicking subscriber only loses the report it panicked on.
//!
//! ## Non-guarantees
//! - No ordering across subscribers (use `Report::seq`).
//! - No retry on overflow.
//!
//! [`SubscriberSet::flush`] waits until every queue has caught up with what
//! was emitted before the call; the supervisor uses it before `run()` returns.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::diagnostics::{Report, Subscribe};

/// Queue item: a report, or a marker acknowledged once everything before it was handled.
enum Message {
    Report(Arc<Report>),
    Flush(oneshot::Sender<()>),
}

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Message>,
}

/// Fan-out with one bounded queue and one worker task per subscriber.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Message>(sub.queue_capacity().max(1));

            workers.push(tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    let report = match msg {
                        Message::Report(report) => report,
                        Message::Flush(ack) => {
                            let _ = ack.send(());
                            continue;
                        }
                    };
                    let fut = std::panic::AssertUnwindSafe(sub.on_report(&report));
                    if fut.catch_unwind().await.is_err() {
                        tracing::warn!(subscriber = name, seq = report.seq, "subscriber panicked");
                    }
                }
            }));
            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self { channels, workers }
    }

    /// Delivers one report to every subscriber queue.
    pub fn emit(&self, report: Report) {
        let report = Arc::new(report);
        for channel in &self.channels {
            match channel.sender.try_send(Message::Report(Arc::clone(&report))) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, "report dropped: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, "report dropped: worker closed");
                }
            }
        }
    }

    /// Waits until every subscriber has handled the reports emitted so far.
    ///
    /// A full queue is waited on, not skipped. The set stays usable afterwards.
    pub async fn flush(&self) {
        let mut acks = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let (ack, done) = oneshot::channel();
            if channel.sender.send(Message::Flush(ack)).await.is_ok() {
                acks.push(done);
            }
        }
        for done in acks {
            let _ = done.await;
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::diagnostics::ReportKind;

    #[derive(Default)]
    struct Collect(Mutex<Vec<u64>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_report(&self, report: &Report) {
            self.0.lock().unwrap().push(report.seq);
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_report(&self, _report: &Report) {
            panic!("subscriber bug");
        }
    }

    #[tokio::test]
    async fn test_fanout_survives_panicking_subscriber() {
        let collect = Arc::new(Collect::default());
        let set = SubscriberSet::new(vec![Arc::new(Explode) as Arc<dyn Subscribe>, collect.clone()]);
        assert_eq!(set.len(), 2);

        let a = Report::now(ReportKind::AttemptStarting);
        let b = Report::now(ReportKind::AttemptFailed);
        let want = vec![a.seq, b.seq];
        set.emit(a);
        set.emit(b);
        set.shutdown().await;

        assert_eq!(*collect.0.lock().unwrap(), want);
    }

    #[tokio::test]
    async fn test_flush_waits_for_slow_subscriber() {
        struct Slow(Mutex<Vec<u64>>);

        #[async_trait]
        impl Subscribe for Slow {
            async fn on_report(&self, report: &Report) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                self.0.lock().unwrap().push(report.seq);
            }
        }

        let slow = Arc::new(Slow(Mutex::new(Vec::new())));
        let set = SubscriberSet::new(vec![slow.clone() as Arc<dyn Subscribe>]);
        let last = Report::now(ReportKind::AllStoppedWithin);
        let seq = last.seq;
        set.emit(Report::now(ReportKind::ShutdownRequested));
        set.emit(last);

        set.flush().await;
        assert_eq!(slow.0.lock().unwrap().last(), Some(&seq));
        assert_eq!(slow.0.lock().unwrap().len(), 2);

        set.emit(Report::now(ReportKind::AttemptStarting));
        set.flush().await;
        assert_eq!(slow.0.lock().unwrap().len(), 3);
    }
}
