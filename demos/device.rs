//! # Example: device
//!
//! A desk display host: three screens share one panel, a doorbell grabs it for a
//! few seconds now and then, and an HTTP form can flip or pause the rotation.
//!
//! ## Flow
//! ```text
//! Supervisor::build()
//!     ├─► bus        (prio 0)
//!     ├─► clock      (prio 5, display)
//!     ├─► weather    (prio 5, display)
//!     ├─► backlight  (prio 5, Toggle display)
//!     ├─► doorbell   (prio 6, publishes FocusRequest every 20s)
//!     └─► switcher   (prio 10) ──► clock → weather → backlight → …
//!
//! admin::router ──► POST /displayswitcher/{next,prev,pause} on 127.0.0.1:8080
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=panelvisor=debug cargo run --example device
//! curl -X POST http://127.0.0.1:8080/displayswitcher/next
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use panelvisor::{
    Activatable, Component, ComponentDescriptor, ComponentError, ComponentFn, Config,
    DisplaySwitcher, EventBus, FocusRequest, Instance, SWITCHER, Supervisor, Toggle, Toggled,
    admin,
};

const CONFIG: &str = r#"{
    "supervisor": { "grace_ms": 2000 },
    "switcher": { "services": ["clock", "weather", "backlight"], "time_ms": 4000, "pause_ms": 30000 },
    "weather": { "city": "Tromsø" }
}"#;

/// Prints a screen until it loses the display.
struct Screen {
    label: String,
}

#[async_trait]
impl Component for Screen {
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        ctx.cancelled().await;
        Err(ComponentError::Canceled)
    }
}

#[async_trait]
impl Activatable for Screen {
    async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Err(ComponentError::Canceled),
                _ = tick.tick() => println!("[display] {}", self.label),
            }
        }
    }
}

/// A screen that is either lit or dark.
#[derive(Default)]
struct Backlight {
    on: AtomicBool,
}

#[async_trait]
impl Toggle for Backlight {
    async fn set_active(&self, active: bool) {
        if self.on.swap(active, Ordering::SeqCst) != active {
            println!("[display] backlight {}", if active { "on" } else { "off" });
        }
    }
}

#[async_trait]
impl Component for Backlight {
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        ctx.cancelled().await;
        Err(ComponentError::Canceled)
    }
}

fn screen(name: &'static str, priority: i32) -> ComponentDescriptor {
    ComponentDescriptor::new(name, priority, move |registry| {
        let label = match registry.config().section::<serde_json::Value>(name) {
            Ok(Some(section)) => format!("{name} {section}"),
            _ => name.to_string(),
        };
        Ok(Some(Instance::display(Arc::new(Screen { label }))))
    })
}

fn backlight() -> ComponentDescriptor {
    ComponentDescriptor::new("backlight", 5, |_| {
        let light = Arc::new(Backlight::default());
        Ok(Some(
            Instance::component(light.clone()).with_display(Arc::new(Toggled::new(light))),
        ))
    })
}

fn doorbell() -> ComponentDescriptor {
    ComponentDescriptor::new("doorbell", 6, |registry| {
        let bus: EventBus = registry.require_bus("doorbell")?;
        Ok(Some(Instance::component(ComponentFn::arc(
            move |ctx: CancellationToken| {
                let bus = bus.clone();
                async move {
                    loop {
                        tokio::select! {
                            _ = ctx.cancelled() => return Err::<(), _>(ComponentError::Canceled),
                            _ = tokio::time::sleep(Duration::from_secs(20)) => {
                                println!("[doorbell] ring");
                                bus.request_focus(
                                    FocusRequest::service("clock").with_hold(Duration::from_secs(3)),
                                );
                            }
                        }
                    }
                }
            },
        ))))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("panelvisor=info")),
        )
        .init();

    let cfg = Config::from_json_str(CONFIG)?;
    let pause = cfg.switcher.pause;

    let sup = Arc::new(
        Supervisor::builder(cfg)
            .with_component(EventBus::descriptor())
            .with_component(screen("clock", 5))
            .with_component(screen("weather", 5))
            .with_component(backlight())
            .with_component(doorbell())
            .with_component(DisplaySwitcher::descriptor(10))
            .build()?,
    );

    let switcher = sup
        .registry()
        .get::<DisplaySwitcher>(SWITCHER)
        .ok_or_else(|| anyhow::anyhow!("switcher was not created"))?;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    let token = sup.cancellation_token();
    tokio::spawn(async move {
        let served = axum::serve(listener, admin::router(switcher, pause))
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await;
        if let Err(err) = served {
            tracing::warn!(error = %err, "admin server stopped");
        }
    });

    sup.run().await?;
    Ok(())
}
