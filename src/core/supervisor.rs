//! # Supervisor: runs every created component forever and shuts down gracefully.
//!
//! The [`Supervisor`] owns the provider [`Registry`], the diagnostics
//! [`SubscriberSet`] and the runtime [`CancellationToken`]. Boot happens in
//! [`SupervisorBuilder::build`]; [`Supervisor::run`] only spawns actors and waits.
//!
//! ## High-level architecture
//! ```text
//! SupervisorBuilder::build()
//!   ├─► Config::validate()
//!   ├─► singletons ──► Registry
//!   └─► boot::instantiate(descriptors) ──► Registry + Vec<Supervised>
//!
//! Supervisor::run():
//!   Supervised[0]  Supervised[1]  ...  Supervised[N-1]
//!       │              │                    │
//!       └──► ComponentActor { name, component, backoff, timeout }
//!                 └──► child token = runtime_token.child_token()
//!                      set.spawn(actor.run(child))
//!
//! Shutdown path:
//!   wait_for_shutdown(runtime_token, handle_signals)
//!       └─► report ShutdownRequested
//!       └─► runtime_token.cancel()   → propagates to every attempt and activation
//!       └─► wait_all_with_grace(cfg.supervisor.grace):
//!              ├─ all joined      → report AllStoppedWithin, Ok(())
//!              └─ grace exceeded  → report GraceExceeded, Err(GraceExceeded { stuck })
//!       └─► subs.flush()   (every report is delivered before run() returns)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use panelvisor::{
//!     ComponentDescriptor, ComponentError, ComponentFn, Config, EventBus, Instance, Supervisor,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.supervisor.handle_signals = false;
//!
//!     let ticker = ComponentDescriptor::new("ticker", 1, |registry| {
//!         let bus = registry.require_bus("ticker")?;
//!         let component = ComponentFn::arc(move |ctx: CancellationToken| {
//!             let bus = bus.clone();
//!             async move {
//!                 while !ctx.is_cancelled() {
//!                     bus.publish("tick", ());
//!                     tokio::time::sleep(Duration::from_millis(10)).await;
//!                 }
//!                 Ok::<_, ComponentError>(())
//!             }
//!         });
//!         Ok(Some(Instance::component(component)))
//!     });
//!
//!     let sup = Supervisor::builder(cfg)
//!         .with_component(EventBus::descriptor())
//!         .with_component(ticker)
//!         .build()?;
//!
//!     let token = sup.cancellation_token();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         token.cancel();
//!     });
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{
    actor::ComponentActor,
    boot::Supervised,
    builder::SupervisorBuilder,
    shutdown::{self, Trigger},
};
use crate::config::Config;
use crate::diagnostics::{Report, ReportKind, SubscriberSet};
use crate::error::RuntimeError;
use crate::registry::Registry;

/// Runs the booted components and coordinates their shutdown.
pub struct Supervisor {
    registry: Arc<Registry>,
    subs: Arc<SubscriberSet>,
    token: CancellationToken,
    names: Vec<Arc<str>>,
    pending: Mutex<Option<Vec<Supervised>>>,
}

impl Supervisor {
    /// Starts building a supervisor around `cfg`.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        registry: Arc<Registry>,
        subs: Arc<SubscriberSet>,
        supervised: Vec<Supervised>,
        token: CancellationToken,
    ) -> Self {
        Self {
            names: supervised.iter().map(|s| Arc::clone(&s.name)).collect(),
            registry,
            subs,
            token,
            pending: Mutex::new(Some(supervised)),
        }
    }

    /// Supervises every component until shutdown is requested, then waits up to
    /// `supervisor.grace` for them to unwind.
    ///
    /// Components are started once; a second call only waits for shutdown.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let supervised = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .unwrap_or_default();

        let mut set = JoinSet::new();
        let mut alive = Vec::with_capacity(supervised.len());
        for s in supervised {
            alive.push(Arc::clone(&s.name));
            let actor = ComponentActor {
                name: s.name,
                component: s.component,
                params: s.params,
                subs: Arc::clone(&self.subs),
            };
            set.spawn(actor.run(self.token.child_token()));
        }

        let trigger =
            shutdown::wait_for_shutdown(&self.token, self.config().supervisor.handle_signals).await;
        self.subs.emit(
            Report::now(ReportKind::ShutdownRequested).with_reason(match trigger {
                Trigger::Token => "shutdown()",
                Trigger::Signal => "signal",
            }),
        );
        self.token.cancel();
        let res = self.wait_all_with_grace(&mut set, alive).await;
        self.subs.flush().await;
        res
    }

    /// Requests shutdown; [`run`](Self::run) then cancels every component.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// The runtime token; cancelling it is the same as [`shutdown`](Self::shutdown).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The provider registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The process configuration.
    pub fn config(&self) -> &Config {
        self.registry.config()
    }

    /// Names of the supervised components, in creation order.
    pub fn components(&self) -> Vec<String> {
        self.names.iter().map(|n| n.to_string()).collect()
    }

    /// Waits for all actors to finish within the configured grace period.
    ///
    /// Reports [`ReportKind::AllStoppedWithin`] on success, or
    /// [`ReportKind::GraceExceeded`] on timeout and returns
    /// [`RuntimeError::GraceExceeded`] with the components still running.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<Arc<str>>,
        mut alive: Vec<Arc<str>>,
    ) -> Result<(), RuntimeError> {
        let grace = self.config().supervisor.grace;
        if grace.is_zero() {
            set.shutdown().await;
            return Ok(());
        }

        let done = async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(name) => alive.retain(|n| *n != name),
                    Err(err) => {
                        tracing::error!(target: "panelvisor", error = %err, "component actor aborted")
                    }
                }
            }
        };
        let timed = tokio::time::timeout(grace, done).await;

        match timed {
            Ok(()) => {
                self.subs.emit(Report::now(ReportKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = alive.iter().map(|n| n.to_string()).collect();
                self.subs
                    .emit(Report::now(ReportKind::GraceExceeded).with_reason(stuck.join(", ")));
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("components", &self.names)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}
