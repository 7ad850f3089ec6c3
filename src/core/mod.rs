//! Supervision runtime.
//!
//! The only public API of this module is [`Supervisor`] and its [`SupervisorBuilder`].
//!
//! Internal modules:
//! - [`boot`]: priority-ordered instantiation into the [`Registry`](crate::Registry);
//! - [`runner`]: one `start()` attempt followed by `stop()`, with panic isolation;
//! - [`actor`]: the restart-forever loop of a single component;
//! - [`supervisor`]: spawns actors, drives shutdown and the grace period;
//! - [`shutdown`]: OS termination signals.

mod actor;
mod boot;
mod builder;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use supervisor::Supervisor;
