//! Display switcher scheduling: round-robin, gating, focus preemption, manual controls.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use panelvisor::{
    Activatable, Component, ComponentError, Config, DisplaySwitcher, EventBus, FocusRequest,
    Instance, Registry, SwitcherConfig, SwitcherState, Toggle, Toggled,
};

/// Shared record of every activation across all panels.
#[derive(Default)]
struct Screen {
    shown: Mutex<Vec<&'static str>>,
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl Screen {
    fn shown(&self) -> Vec<&'static str> {
        self.shown.lock().unwrap().clone()
    }
}

struct Panel {
    name: &'static str,
    screen: Arc<Screen>,
    willing: AtomicBool,
}

#[async_trait]
impl Component for Panel {
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        ctx.cancelled().await;
        Err(ComponentError::Canceled)
    }
}

#[async_trait]
impl Activatable for Panel {
    fn should_activate(&self) -> bool {
        self.willing.load(Ordering::SeqCst)
    }

    async fn activate(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        self.screen.shown.lock().unwrap().push(self.name);
        let live = self.screen.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.screen.peak.fetch_max(live, Ordering::SeqCst);

        ctx.cancelled().await;
        // Give the unwind a suspension point so overlap would be observable.
        tokio::task::yield_now().await;
        self.screen.live.fetch_sub(1, Ordering::SeqCst);
        Err(ComponentError::Canceled)
    }
}

struct Rig {
    registry: Arc<Registry>,
    screen: Arc<Screen>,
    panels: Vec<Arc<Panel>>,
    bus: EventBus,
}

impl Rig {
    fn new(names: &[&'static str]) -> Self {
        let registry = Registry::new(Config::default());
        let screen = Arc::new(Screen::default());
        let bus = EventBus::new();
        let mut panels = Vec::new();
        for &name in names {
            let panel = Arc::new(Panel {
                name,
                screen: screen.clone(),
                willing: AtomicBool::new(true),
            });
            registry.insert(name, Instance::display(panel.clone())).unwrap();
            panels.push(panel);
        }
        Self {
            registry,
            screen,
            panels,
            bus,
        }
    }

    fn start(&self, dwell: Duration, with_bus: bool) -> (Arc<DisplaySwitcher>, CancellationToken, JoinHandle<()>) {
        let cfg = SwitcherConfig {
            services: self.panels.iter().map(|p| p.name.to_string()).collect(),
            time: dwell,
            ..SwitcherConfig::default()
        };
        let bus = with_bus.then(|| self.bus.clone());
        let switcher = Arc::new(DisplaySwitcher::new(&self.registry, &cfg, bus));
        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let switcher = switcher.clone();
            let token = token.clone();
            async move {
                let _ = switcher.start(token).await;
            }
        });
        (switcher, token, handle)
    }
}

#[tokio::test(start_paused = true)]
async fn test_round_robin_never_overlaps() {
    let rig = Rig::new(&["a", "b", "c"]);
    let (switcher, token, handle) = rig.start(Duration::from_millis(100), false);

    sleep(Duration::from_millis(650)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "c", "a", "b", "c", "a"]);
    assert_eq!(rig.screen.peak.load(Ordering::SeqCst), 1);
    assert_eq!(switcher.state(), SwitcherState::Showing);
    assert_eq!(switcher.current().as_deref(), Some("a"));

    token.cancel();
    handle.await.unwrap();
    assert_eq!(rig.screen.live.load(Ordering::SeqCst), 0);
    assert_eq!(switcher.state(), SwitcherState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_declining_service_is_skipped() {
    let rig = Rig::new(&["a", "b", "c"]);
    rig.panels[1].willing.store(false, Ordering::SeqCst);
    let (_switcher, token, handle) = rig.start(Duration::from_millis(100), false);

    sleep(Duration::from_millis(350)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "c", "a", "c"]);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_all_declining_idles_without_spinning() {
    let rig = Rig::new(&["a", "b"]);
    for p in &rig.panels {
        p.willing.store(false, Ordering::SeqCst);
    }
    let (switcher, token, handle) = rig.start(Duration::from_millis(100), false);

    sleep(Duration::from_millis(250)).await;
    assert!(rig.screen.shown().is_empty());
    assert_eq!(switcher.state(), SwitcherState::Idle);

    rig.panels[1].willing.store(true, Ordering::SeqCst);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(rig.screen.shown(), vec!["b"]);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_empty_service_list_idles() {
    let rig = Rig::new(&[]);
    let (switcher, token, handle) = rig.start(Duration::from_millis(100), true);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(switcher.state(), SwitcherState::Idle);
    assert!(switcher.current().is_none());

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_focus_preempts_and_chains() {
    let rig = Rig::new(&["a", "b", "c"]);
    let (switcher, token, handle) = rig.start(Duration::from_millis(1000), true);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(rig.screen.shown(), vec!["a"]);

    rig.bus
        .request_focus(FocusRequest::service("b").with_hold(Duration::from_millis(50)));
    sleep(Duration::from_millis(20)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b"]);
    assert_eq!(switcher.state(), SwitcherState::Focused);

    // Chained before b's hold runs out; c gets a fresh hold (the dwell time).
    rig.bus.request_focus(FocusRequest::service("c"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "c"]);
    assert_eq!(switcher.current().as_deref(), Some("c"));

    // Hold ends at ~1120ms; round-robin resumes after "a".
    sleep(Duration::from_millis(950)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "c", "b"]);
    assert_eq!(switcher.state(), SwitcherState::Showing);
    assert_eq!(rig.screen.peak.load(Ordering::SeqCst), 1);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_focus_bypasses_gate_and_accepts_instances() {
    let rig = Rig::new(&["a", "b"]);
    rig.panels[1].willing.store(false, Ordering::SeqCst);
    let (_switcher, token, handle) = rig.start(Duration::from_millis(1000), true);

    sleep(Duration::from_millis(10)).await;
    rig.bus
        .request_focus(FocusRequest::service("b").with_hold(Duration::from_millis(30)));
    sleep(Duration::from_millis(10)).await;

    let popup = Arc::new(Panel {
        name: "popup",
        screen: rig.screen.clone(),
        willing: AtomicBool::new(false),
    });
    rig.bus
        .request_focus(FocusRequest::instance(popup).with_hold(Duration::from_millis(30)));
    sleep(Duration::from_millis(10)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "popup"]);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_focus_ends_focus() {
    let rig = Rig::new(&["a", "b", "c"]);
    let (switcher, token, handle) = rig.start(Duration::from_millis(1000), true);

    sleep(Duration::from_millis(10)).await;
    rig.bus
        .request_focus(FocusRequest::service("c").with_hold(Duration::from_secs(60)));
    sleep(Duration::from_millis(10)).await;
    assert_eq!(switcher.state(), SwitcherState::Focused);

    rig.bus.request_focus(FocusRequest::service("nowhere"));
    sleep(Duration::from_millis(10)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "c", "b"]);
    assert_eq!(switcher.state(), SwitcherState::Showing);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_without_bus_focus_is_ignored() {
    let rig = Rig::new(&["a", "b"]);
    let (_switcher, token, handle) = rig.start(Duration::from_millis(100), false);

    sleep(Duration::from_millis(10)).await;
    assert_eq!(rig.bus.request_focus(FocusRequest::service("b")), 0);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.screen.shown(), vec!["a"]);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_next_cuts_the_dwell_short() {
    let rig = Rig::new(&["a", "b", "c"]);
    let (switcher, token, handle) = rig.start(Duration::from_secs(10), false);

    sleep(Duration::from_millis(1)).await;
    switcher.next();
    sleep(Duration::from_millis(1)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b"]);

    switcher.prev();
    sleep(Duration::from_millis(1)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "a"]);

    switcher.prev();
    sleep(Duration::from_millis(1)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "a", "c"]);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_the_current_service() {
    let rig = Rig::new(&["a", "b", "c"]);
    let (switcher, token, handle) = rig.start(Duration::from_millis(100), false);

    sleep(Duration::from_millis(250)).await;
    assert_eq!(switcher.current().as_deref(), Some("c"));

    switcher.pause(Duration::from_secs(3600));
    sleep(Duration::from_millis(1)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "c", "c"]);
    assert_eq!(switcher.state(), SwitcherState::Paused);

    sleep(Duration::from_secs(600)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "c", "c"]);

    switcher.next();
    sleep(Duration::from_millis(1)).await;
    assert_eq!(rig.screen.shown(), vec!["a", "b", "c", "c", "a"]);
    assert_eq!(switcher.state(), SwitcherState::Showing);

    token.cancel();
    handle.await.unwrap();
}

#[derive(Default)]
struct Backlight(Mutex<Vec<bool>>);

#[async_trait]
impl Toggle for Backlight {
    async fn set_active(&self, active: bool) {
        self.0.lock().unwrap().push(active);
    }
}

#[async_trait]
impl Component for Backlight {
    async fn start(&self, ctx: CancellationToken) -> Result<(), ComponentError> {
        ctx.cancelled().await;
        Err(ComponentError::Canceled)
    }
}

#[tokio::test(start_paused = true)]
async fn test_toggle_displays_take_turns() {
    let rig = Rig::new(&["a"]);
    let light = Arc::new(Backlight::default());
    rig.registry
        .insert(
            "light",
            Instance::component(light.clone()).with_display(Arc::new(Toggled::new(light.clone()))),
        )
        .unwrap();

    let cfg = SwitcherConfig {
        services: vec!["a".into(), "light".into()],
        time: Duration::from_millis(100),
        ..SwitcherConfig::default()
    };
    let switcher = Arc::new(DisplaySwitcher::new(&rig.registry, &cfg, None));
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let switcher = switcher.clone();
        let token = token.clone();
        async move {
            let _ = switcher.start(token).await;
        }
    });

    sleep(Duration::from_millis(250)).await;
    assert_eq!(*light.0.lock().unwrap(), vec![true, false]);
    assert_eq!(rig.screen.shown(), vec!["a", "a"]);

    token.cancel();
    handle.await.unwrap();
}
