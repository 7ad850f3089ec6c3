//! # Component abstractions.
//!
//! - [`Component`] - the supervised unit (`start`/`stop`)
//! - [`Activatable`] - optional display capability driven by the [`DisplaySwitcher`](crate::DisplaySwitcher)
//! - [`Toggle`] / [`Toggled`] - adapter for displays that only know "on"/"off"
//! - [`ComponentFn`] - closure-backed component
//! - [`ComponentDescriptor`] / [`Instance`] - static `{name, priority, factory}` records assembled at build time

mod activatable;
mod component;
mod component_fn;
mod descriptor;

pub use activatable::{Activatable, Toggle, Toggled};
pub use component::{Component, ComponentRef};
pub use component_fn::ComponentFn;
pub use descriptor::{ComponentDescriptor, Factory, Instance};
