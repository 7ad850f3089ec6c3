//! Restart pacing policies.
//!
//! A supervised component is restarted forever; these knobs only control
//! **how long** the supervisor waits before the next `start()` after a failure.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the pause evolves over consecutive failures (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization to keep crashing components from restarting in lockstep
//!
//! ## Wiring
//! ```text
//! Config.supervisor.backoff ──► ComponentDescriptor (optional override)
//!      └─► core::actor::ComponentActor:
//!           - clean exit  → failures = 0, restart right away
//!           - failed exit → sleep(backoff.next(failures)), failures += 1
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=1s, factor=1.0 (constant), max=30s, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
