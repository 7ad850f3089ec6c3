//! # DisplaySwitcher: round-robin display scheduler with focus preemption.
//!
//! ```text
//! loop {
//!   ├─ advance index (skip should_activate() == false)
//!   │     ├─ found     ──► slot.replace(display)     Showing
//!   │     └─ none      ──► slot.clear()              Idle
//!   └─ wait(pause pending ? pause : dwell)           (Paused while a pause runs)
//!         race: timer | trigger | focus.request | cancel
//!         ├─ timer / trigger ──► next iteration
//!         └─ focus.request   ──► Focused:
//!               loop {
//!                 resolve target (instance > service)   unresolvable ─► end focus
//!                 slot.replace(target)
//!                 wait(hold) ── timer / trigger ─► end focus
//!                            └─ focus.request ─► chain (fresh hold)
//!               }
//!               slot.clear(), next iteration continues after the pre-focus index
//! }
//! ```
//!
//! ## Manual controls
//! - [`next`](DisplaySwitcher::next): fire the trigger.
//! - [`prev`](DisplaySwitcher::prev): index -= 2, fire the trigger.
//! - [`pause`](DisplaySwitcher::pause): index -= 1, arm a pause, fire the trigger.
//!   The current service is shown again and the pause replaces its dwell.
//!
//! Index and pause are updated under one lock, so a `prev` racing a `pause`
//! always leaves both adjustments applied.

use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::bus::{Event, EventBus, Stream};
use crate::components::{Activatable, Component, ComponentDescriptor, Instance};
use crate::config::SwitcherConfig;
use crate::error::ComponentError;
use crate::race::WaitFirst;
use crate::registry::Registry;
use crate::switcher::focus::{self, FOCUS_TOPIC};
use crate::switcher::slot::ActiveSlot;

/// Registry name of the display switcher.
pub const SWITCHER: &str = "displayswitcher";

/// What the switcher is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitcherState {
    /// No display owns the screen (empty or fully declining service list, or not running).
    Idle,
    /// A round-robin service owns the screen.
    Showing,
    /// Round-robin is held on the current service.
    Paused,
    /// A focus request owns the screen.
    Focused,
}

struct Cursor {
    index: i64,
    pause: Option<Duration>,
    /// Bumped by every manual control; a wait started at an older value ends at once.
    generation: u64,
    state: SwitcherState,
    current: Option<Arc<str>>,
}

/// Outcome of one cursor step.
struct Tick {
    /// Manual-control generation observed when the step was taken.
    seen: u64,
    pause: Option<Duration>,
    shown: Option<(Arc<str>, Arc<dyn Activatable>)>,
}

/// Why a wait ended.
enum Wake {
    Elapsed,
    Trigger,
    Focus(Event),
    Cancelled,
}

/// Multiplexes the shared display between the configured services.
pub struct DisplaySwitcher {
    registry: Weak<Registry>,
    services: Vec<String>,
    dwell: Duration,
    unwind: Duration,
    bus: Option<EventBus>,
    cursor: Mutex<Cursor>,
    trigger: Notify,
}

impl DisplaySwitcher {
    /// Creates a switcher over `cfg.services`.
    ///
    /// Without a `bus` the switcher never preempts; it only cycles.
    pub fn new(registry: &Arc<Registry>, cfg: &SwitcherConfig, bus: Option<EventBus>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            services: cfg.services.clone(),
            dwell: cfg.time,
            unwind: cfg.unwind,
            bus,
            cursor: Mutex::new(Cursor {
                index: -1,
                pause: None,
                generation: 0,
                state: SwitcherState::Idle,
                current: None,
            }),
            trigger: Notify::new(),
        }
    }

    /// Descriptor registering a switcher under [`SWITCHER`], configured from
    /// `config.switcher` and wired to the registered bus, if any.
    pub fn descriptor(priority: i32) -> ComponentDescriptor {
        ComponentDescriptor::new(SWITCHER, priority, |registry| {
            let switcher = DisplaySwitcher::new(registry, &registry.config().switcher, registry.bus());
            Ok(Some(Instance::component(Arc::new(switcher))))
        })
    }

    /// Ends the current dwell (or focus, or pause) now and advances.
    pub fn next(&self) {
        self.control(|_| {});
    }

    /// Goes back one service.
    pub fn prev(&self) {
        self.control(|cursor| cursor.index -= 2);
    }

    /// Shows the current service again and holds it for `duration` before
    /// resuming the round-robin.
    pub fn pause(&self, duration: Duration) {
        self.control(|cursor| {
            cursor.index -= 1;
            cursor.pause = Some(duration);
        });
    }

    /// Name of the display owning the screen.
    pub fn current(&self) -> Option<String> {
        self.cursor().current.as_deref().map(str::to_string)
    }

    /// Current scheduler state.
    pub fn state(&self) -> SwitcherState {
        self.cursor().state
    }

    /// Configured services, in round-robin order.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    async fn run(&self, ctx: &CancellationToken) -> Result<(), ComponentError> {
        let mut slot = ActiveSlot::new(self.unwind);
        let mut focus = self.bus.as_ref().map(|bus| bus.stream(FOCUS_TOPIC));

        let res = self.schedule(&mut slot, &mut focus, ctx).await;
        slot.clear().await;
        self.set_state(SwitcherState::Idle, None);
        res
    }

    async fn schedule(
        &self,
        slot: &mut ActiveSlot,
        focus: &mut Option<Stream>,
        ctx: &CancellationToken,
    ) -> Result<(), ComponentError> {
        loop {
            let registry = self
                .registry
                .upgrade()
                .ok_or_else(|| ComponentError::fail("registry dropped"))?;
            let tick = self.advance(&registry);
            drop(registry);

            let showing = match tick.shown {
                Some((name, display)) => {
                    tracing::debug!(target: "panelvisor::switcher", display = %name, "showing");
                    slot.replace(Arc::clone(&name), display, ctx).await;
                    Some(name)
                }
                None => {
                    slot.clear().await;
                    None
                }
            };

            let (dur, state) = match (tick.pause, &showing) {
                (Some(pause), _) => {
                    tracing::debug!(target: "panelvisor::switcher", ?pause, "paused");
                    (pause, SwitcherState::Paused)
                }
                (None, Some(_)) => (self.dwell, SwitcherState::Showing),
                (None, None) => (self.dwell, SwitcherState::Idle),
            };
            self.set_state(state, showing);

            match self.wait(dur, tick.seen, focus, ctx).await {
                Wake::Cancelled => return Err(ComponentError::Canceled),
                Wake::Focus(ev) => self.hold_focus(ev, tick.seen, slot, focus, ctx).await?,
                Wake::Elapsed | Wake::Trigger => {}
            }
        }
    }

    /// Shows focus targets until a hold expires without a new request.
    ///
    /// `seen` is the control generation of the wait that delivered `ev`; any
    /// control newer than it ends the focus.
    async fn hold_focus(
        &self,
        mut ev: Event,
        seen: u64,
        slot: &mut ActiveSlot,
        focus: &mut Option<Stream>,
        ctx: &CancellationToken,
    ) -> Result<(), ComponentError> {
        loop {
            let target = self
                .registry
                .upgrade()
                .and_then(|registry| focus::resolve(&ev, &registry, self.dwell));
            let Some(target) = target else {
                tracing::debug!(target: "panelvisor::switcher", seq = ev.seq(), "unresolvable focus request");
                break;
            };

            tracing::debug!(target: "panelvisor::switcher", display = %target.name, hold = ?target.hold, "focus");
            slot.replace(Arc::clone(&target.name), target.display, ctx).await;
            self.set_state(SwitcherState::Focused, Some(target.name));

            match self.wait(target.hold, seen, focus, ctx).await {
                Wake::Cancelled => return Err(ComponentError::Canceled),
                Wake::Focus(next) => ev = next,
                Wake::Elapsed | Wake::Trigger => break,
            }
        }
        slot.clear().await;
        self.set_state(SwitcherState::Idle, None);
        Ok(())
    }

    /// Moves the cursor to the next service willing to show.
    ///
    /// `shown` is `None` after a full cycle of refusals (or with no services at all).
    /// The generation and the pending pause are read under the same lock as the
    /// first step, so a control call lands either entirely before or entirely after it.
    fn advance(&self, registry: &Registry) -> Tick {
        let len = self.services.len() as i64;
        let mut cursor = self.cursor();
        let mut tick = Tick {
            seen: cursor.generation,
            pause: cursor.pause.take(),
            shown: None,
        };

        for _ in 0..len {
            cursor.index = (cursor.index + 1).rem_euclid(len);
            let name = &self.services[cursor.index as usize];
            drop(cursor);

            match registry.display(name) {
                Some(display) if display.should_activate() => {
                    tick.shown = Some((Arc::from(name.as_str()), display));
                    return tick;
                }
                Some(_) => {
                    tracing::trace!(target: "panelvisor::switcher", display = %name, "declined");
                }
                None => {
                    tracing::debug!(target: "panelvisor::switcher", service = %name, "not a registered display");
                }
            }
            cursor = self.cursor();
        }
        tick
    }

    /// Races `dur` against manual controls newer than `seen`, the next focus
    /// request and cancellation.
    async fn wait(
        &self,
        dur: Duration,
        seen: u64,
        focus: &mut Option<Stream>,
        ctx: &CancellationToken,
    ) -> Wake {
        let mut race = WaitFirst::<Wake, Infallible>::new();
        race.push(async move {
            tokio::time::sleep(dur).await;
            Ok(Wake::Elapsed)
        });
        race.push(async move {
            self.controlled_since(seen).await;
            Ok(Wake::Trigger)
        });
        race.push(async {
            ctx.cancelled().await;
            Ok(Wake::Cancelled)
        });
        if let Some(stream) = focus.as_mut() {
            race.push(async move {
                match stream.get().await {
                    Some(ev) => Ok(Wake::Focus(ev)),
                    None => future::pending().await,
                }
            });
        }
        race.wait().await.map_or(Wake::Elapsed, |(_, wake)| wake)
    }

    /// Completes once a manual control newer than `seen` was applied.
    async fn controlled_since(&self, seen: u64) {
        loop {
            // Registered before the check, so a control between the two is not missed.
            let notified = self.trigger.notified();
            if self.cursor().generation != seen {
                return;
            }
            notified.await;
        }
    }

    fn control(&self, apply: impl FnOnce(&mut Cursor)) {
        {
            let mut cursor = self.cursor();
            apply(&mut cursor);
            cursor.generation = cursor.generation.wrapping_add(1);
        }
        self.trigger.notify_waiters();
    }

    fn set_state(&self, state: SwitcherState, current: Option<Arc<str>>) {
        let mut cursor = self.cursor();
        cursor.state = state;
        cursor.current = current;
    }

    fn cursor(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for DisplaySwitcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplaySwitcher")
            .field("services", &self.services)
            .field("dwell", &self.dwell)
            .field("state", &self.state())
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Component for DisplaySwitcher {
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        self.run(&ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    struct Dummy;

    #[async_trait]
    impl Component for Dummy {
        async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
            ctx.cancelled().await;
            Err(ComponentError::Canceled)
        }
    }

    #[async_trait]
    impl Activatable for Dummy {
        async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
            ctx.cancelled().await;
            Err(ComponentError::Canceled)
        }
    }

    fn switcher(services: &[&str]) -> (Arc<Registry>, DisplaySwitcher) {
        let registry = Registry::new(Config::default());
        for name in services {
            registry
                .insert(*name, Instance::display(Arc::new(Dummy)))
                .unwrap();
        }
        let cfg = SwitcherConfig {
            services: services.iter().map(|s| s.to_string()).collect(),
            ..SwitcherConfig::default()
        };
        let sw = DisplaySwitcher::new(&registry, &cfg, None);
        (registry, sw)
    }

    #[test]
    fn test_advance_wraps_around() {
        let (registry, sw) = switcher(&["a", "b", "c"]);
        let seen: Vec<String> = (0..5)
            .map(|_| sw.advance(&registry).shown.unwrap().0.to_string())
            .collect();
        assert_eq!(seen, vec!["a", "b", "c", "a", "b"]);
    }

    #[test]
    fn test_prev_and_pause_adjust_index() {
        let (registry, sw) = switcher(&["a", "b", "c"]);
        sw.advance(&registry);
        sw.advance(&registry); // showing b
        let before = sw.cursor().generation;
        sw.prev();
        let tick = sw.advance(&registry);
        assert_eq!(&*tick.shown.unwrap().0, "a");
        assert_ne!(tick.seen, before);
        sw.pause(Duration::from_secs(1));
        let tick = sw.advance(&registry);
        assert_eq!(&*tick.shown.unwrap().0, "a");
        assert_eq!(tick.pause, Some(Duration::from_secs(1)));
        assert!(sw.advance(&registry).pause.is_none());
    }

    #[test]
    fn test_prev_from_start_wraps_to_the_end() {
        let (registry, sw) = switcher(&["a", "b", "c"]);
        sw.advance(&registry); // showing a
        sw.prev();
        assert_eq!(&*sw.advance(&registry).shown.unwrap().0, "c");
    }

    #[test]
    fn test_empty_and_unknown_services() {
        let (registry, sw) = switcher(&[]);
        assert!(sw.advance(&registry).shown.is_none());

        let cfg = SwitcherConfig {
            services: vec!["ghost".into()],
            ..SwitcherConfig::default()
        };
        let sw = DisplaySwitcher::new(&registry, &cfg, None);
        assert!(sw.advance(&registry).shown.is_none());
        assert_eq!(sw.state(), SwitcherState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_after_focus_wake_ends_the_hold() {
        let (_registry, sw) = switcher(&["a", "b"]);
        let seen = sw.cursor().generation;
        // Lands after the wait that delivered the request returned.
        sw.next();

        let mut slot = ActiveSlot::new(Duration::from_secs(1));
        let mut requests = None;
        let ctx = CancellationToken::new();
        let ev = Event::new(
            FOCUS_TOPIC,
            focus::FocusRequest::service("b").with_hold(Duration::from_secs(60)),
        );

        let started = tokio::time::Instant::now();
        sw.hold_focus(ev, seen, &mut slot, &mut requests, &ctx)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sw.state(), SwitcherState::Idle);
    }
}
