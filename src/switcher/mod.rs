//! # Display scheduling.
//!
//! - [`DisplaySwitcher`] - round-robin over `config.switcher.services`, preempted by focus requests
//! - [`FocusRequest`] / [`FOCUS_TOPIC`] - how other components ask for the display
//! - [`SwitcherState`] - introspection for status pages

mod focus;
mod slot;
#[allow(clippy::module_inception)]
mod switcher;

pub use focus::{FOCUS_TOPIC, FocusRequest};
pub use switcher::{DisplaySwitcher, SWITCHER, SwitcherState};
