//! # panelvisor
//!
//! **Panelvisor** is the orchestration layer of a small always-on device that
//! hosts many independent components (network clients, sensors, clock and
//! weather screens) in one process and shares a single display between them.
//!
//! It provides:
//! - a **supervisor** that creates components in dependency (priority) order and
//!   restarts each one forever, isolated from the others;
//! - a topic **event bus** with callback and pull-stream subscribers;
//! - a first-of-N **race** primitive that cancels the losers;
//! - a **display switcher** that cycles the screen between displays, yields it to
//!   focus requests and obeys manual next/prev/pause.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ComponentDescriptor { name, priority, factory }  ×N   (explicit list, no discovery)
//!            │
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SupervisorBuilder::build()                                       │
//! │  - sort by priority (stable)                                      │
//! │  - factory(&registry) ─► Registry { name → instance, config }     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌───────────┐      ┌───────────┐      ┌─────────────────┐
//!   │ EventBus  │      │ component │      │ DisplaySwitcher │
//!   │ (prio 0)  │      │  actor    │      │  actor          │
//!   └─────┬─────┘      └─────┬─────┘      └───┬─────────┬───┘
//!         │  publish()       │                │ activate│()  (one at a time)
//!         │◄─────────────────┘                │         ▼
//!         │  "focus.request" stream ─────────►│    display components
//!         ▼                                   │
//!   callbacks / streams              admin::router (POST next/prev/pause)
//!
//!  every actor ── Report ──► SubscriberSet ──► LogWriter / custom Subscribe
//! ```
//!
//! ### Component lifecycle
//! ```text
//! loop {
//!   ├─► attempt += 1, report AttemptStarting
//!   ├─► start(child token)         (optional timeout, panics caught)
//!   ├─► stop()                     (always; failures reported and ignored)
//!   ├─ Ok / cancelled ─► restart at once
//!   └─ Err            ─► report BackoffScheduled, sleep(backoff), restart
//! }
//! exit only when the runtime token is cancelled (signal or Supervisor::shutdown)
//! ```
//!
//! ## Features
//! | Area            | Description                                                   | Key types / traits                                   |
//! |-----------------|---------------------------------------------------------------|------------------------------------------------------|
//! | **Supervision** | Priority-ordered creation, restart loops, graceful shutdown.  | [`Supervisor`], [`ComponentDescriptor`], [`Component`] |
//! | **Registry**    | Name → instance lookups for factories and components.         | [`Registry`]                                         |
//! | **Event bus**   | Topic pub/sub with callbacks and FIFO streams.                | [`EventBus`], [`Event`], [`Stream`]                  |
//! | **Race**        | First-of-N with loser cancellation, timeouts.                 | [`WaitFirst`], [`race::timeout`]                     |
//! | **Display**     | Round-robin scheduling, focus preemption, manual control.     | [`DisplaySwitcher`], [`Activatable`], [`FocusRequest`] |
//! | **Diagnostics** | Supervision reports fanned out to subscribers.                | [`Report`], [`Subscribe`], [`LogWriter`]             |
//! | **Policies**    | Restart back-off with jitter.                                 | [`BackoffPolicy`], [`JitterPolicy`]                  |
//! | **Config**      | JSON configuration with typed sections.                       | [`Config`]                                           |
//!
//! ## Optional features
//! - `admin` (default): [`admin::router`], the HTTP routes driving the switcher.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use panelvisor::{
//!     Activatable, Component, ComponentDescriptor, ComponentError, Config, DisplaySwitcher,
//!     EventBus, Instance, Supervisor,
//! };
//!
//! struct Clock;
//!
//! #[async_trait]
//! impl Component for Clock {
//!     async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
//!         ctx.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Activatable for Clock {
//!     async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
//!         // draw the time until the display is taken away
//!         ctx.cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::from_json_str(
//!         r#"{ "supervisor": { "handle_signals": false },
//!              "switcher": { "services": ["clock"], "time_ms": 100 } }"#,
//!     )?;
//!
//!     let sup = Supervisor::builder(cfg)
//!         .with_component(EventBus::descriptor())
//!         .with_component(ComponentDescriptor::new("clock", 1, |_| {
//!             Ok(Some(Instance::display(Arc::new(Clock))))
//!         }))
//!         .with_component(DisplaySwitcher::descriptor(10))
//!         .build()?;
//!
//!     let token = sup.cancellation_token();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(250)).await;
//!         token.cancel();
//!     });
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```
mod bus;
mod components;
mod config;
mod core;
mod diagnostics;
mod error;
mod policies;
mod registry;
mod switcher;

pub mod race;

#[cfg(feature = "admin")]
pub mod admin;

// ---- Public re-exports ----

pub use bus::{Event, EventBus, Stream, SubscriptionToken};
pub use components::{
    Activatable, Component, ComponentDescriptor, ComponentFn, ComponentRef, Factory, Instance,
    Toggle, Toggled,
};
pub use config::{Config, SupervisorConfig, SwitcherConfig};
pub use self::core::{Supervisor, SupervisorBuilder};
pub use diagnostics::{LogWriter, Report, ReportKind, Subscribe, SubscriberSet};
pub use error::{ComponentError, ConfigError, RaceError, RuntimeError};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use race::WaitFirst;
pub use registry::{BUS, Registry};
pub use switcher::{DisplaySwitcher, FOCUS_TOPIC, FocusRequest, SWITCHER, SwitcherState};
