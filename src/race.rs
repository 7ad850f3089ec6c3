//! # First-of-N race with cancellation of the losers.
//!
//! [`WaitFirst`] runs several fallible operations side by side. The first one to
//! finish, successfully or not, wins; every other racer is cancelled before
//! [`WaitFirst::wait`] returns, so repeated races never accumulate stray work.
//!
//! ```text
//! push(a) ─┐                                  ┌─ Ok(v)  → Ok((i, v))
//! push(b) ─┼─► wait() ─► first to finish (i) ─┤
//! spawn(c)─┘     └─► drop local losers,        └─ Err(e) → Err(RaceError::Failed { index: i, error: e })
//!                    abort + join spawned losers
//! ```
//!
//! Racers come in two flavours:
//! - [`WaitFirst::push`]: a future polled in place (may borrow from the caller);
//!   cancelling it means dropping it.
//! - [`WaitFirst::spawn`]: a future run as its own task; cancelling it means
//!   aborting the task and waiting until the runtime has torn it down.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use panelvisor::WaitFirst;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut race = WaitFirst::<&str, ()>::new();
//! race.push(async { tokio::time::sleep(Duration::from_secs(5)).await; Ok("slow") });
//! race.push(async { Ok("fast") });
//! assert_eq!(race.wait().await, Ok((1, "fast")));
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::task::JoinSet;

use crate::error::RaceError;

/// A set of racers; see the module docs.
pub struct WaitFirst<'a, T, E> {
    local: Vec<(usize, BoxFuture<'a, Result<T, E>>)>,
    spawned: JoinSet<(usize, Result<T, E>)>,
    next: usize,
}

impl<'a, T, E> WaitFirst<'a, T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates an empty race.
    pub fn new() -> Self {
        Self {
            local: Vec::new(),
            spawned: JoinSet::new(),
            next: 0,
        }
    }

    /// Adds a racer polled in place; returns its index.
    pub fn push<F>(&mut self, fut: F) -> usize
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        let index = self.next_index();
        self.local.push((index, fut.boxed()));
        index
    }

    /// Adds a racer running as its own task; returns its index.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn<F>(&mut self, fut: F) -> usize
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let index = self.next_index();
        self.spawned.spawn(async move { (index, fut.await) });
        index
    }

    /// Number of racers.
    pub fn len(&self) -> usize {
        self.next
    }

    /// True if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    /// Waits for the first racer to finish, cancels the rest, and returns the winner.
    ///
    /// A panic inside a spawned racer is resumed here.
    pub async fn wait(self) -> Result<(usize, T), RaceError<E>> {
        if self.is_empty() {
            return Err(RaceError::Empty);
        }
        let WaitFirst {
            local,
            mut spawned,
            ..
        } = self;

        let (index, res) = {
            let indices: Vec<usize> = local.iter().map(|(i, _)| *i).collect();
            let futs: Vec<_> = local.into_iter().map(|(_, f)| f).collect();
            let local_winner = async move {
                if futs.is_empty() {
                    return future::pending().await;
                }
                let (res, pos, _losers) = future::select_all(futs).await;
                (indices[pos], res)
            };
            let spawned_winner = async {
                loop {
                    match spawned.join_next().await {
                        Some(Ok(done)) => return done,
                        Some(Err(err)) if err.is_panic() => {
                            std::panic::resume_unwind(err.into_panic())
                        }
                        Some(Err(_)) => continue,
                        None => future::pending::<()>().await,
                    }
                }
            };
            tokio::select! {
                done = local_winner => done,
                done = spawned_winner => done,
            }
        };
        spawned.shutdown().await;

        res.map(|v| (index, v))
            .map_err(|error| RaceError::Failed { index, error })
    }

    fn next_index(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }
}

impl<T, E> Default for WaitFirst<'_, T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Races `fut` against a timer of `dur`.
///
/// Expiry is reported as [`RaceError::Timeout`]; an error of `fut` as
/// [`RaceError::Failed`] with index `0`.
pub async fn timeout<'a, F, T, E>(dur: Duration, fut: F) -> Result<T, RaceError<E>>
where
    F: Future<Output = Result<T, E>> + Send + 'a,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut race = WaitFirst::new();
    race.push(async move { fut.await.map(Some) });
    race.push(async move {
        tokio::time::sleep(dur).await;
        Ok(None)
    });
    match race.wait().await? {
        (_, Some(v)) => Ok(v),
        (_, None) => Err(RaceError::Timeout { timeout: dur }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct OnDrop(Arc<AtomicUsize>);

    impl Drop for OnDrop {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn sleepy(ms: u64, value: u32, dropped: Arc<AtomicUsize>) -> Result<u32, String> {
        let _guard = OnDrop(dropped);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    }

    #[tokio::test]
    async fn test_empty_race() {
        let race = WaitFirst::<(), ()>::new();
        assert_eq!(race.wait().await, Err(RaceError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_losers_are_dropped() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut race = WaitFirst::new();
        race.push(sleepy(300, 0, dropped.clone()));
        race.push(sleepy(100, 1, dropped.clone()));
        race.push(sleepy(200, 2, dropped.clone()));

        assert_eq!(race.wait().await, Ok((1, 1)));
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_losers_are_aborted() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut race = WaitFirst::new();
        race.spawn(sleepy(300, 0, dropped.clone()));
        race.push(sleepy(100, 1, dropped.clone()));
        race.spawn(sleepy(200, 2, dropped.clone()));

        assert_eq!(race.wait().await, Ok((1, 1)));
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_winner() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut race = WaitFirst::new();
        race.push(sleepy(300, 0, dropped.clone()));
        race.spawn(sleepy(50, 1, dropped.clone()));

        assert_eq!(race.wait().await, Ok((1, 1)));
        assert_eq!(dropped.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_winner_error_surfaces() {
        let mut race = WaitFirst::<u32, String>::new();
        race.push(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(1)
        });
        race.push(async { Err("broken sensor".to_string()) });

        assert_eq!(
            race.wait().await,
            Err(RaceError::Failed {
                index: 1,
                error: "broken sensor".to_string()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_helper() {
        let fast = timeout(Duration::from_millis(100), async { Ok::<_, ()>(5) }).await;
        assert_eq!(fast, Ok(5));

        let slow = timeout(Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, ()>(5)
        })
        .await;
        assert_eq!(
            slow,
            Err(RaceError::Timeout {
                timeout: Duration::from_millis(100)
            })
        );
    }
}
