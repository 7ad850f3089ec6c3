//! Races as hosted components use them: bus waits against timers and losers that must stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::sleep;

use panelvisor::{EventBus, RaceError, WaitFirst, race};

/// Sets its flag when the racer holding it is cancelled.
struct CancelHook(Arc<AtomicBool>);

impl Drop for CancelHook {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_racer_wins_and_others_are_cancelled() {
    let first = Arc::new(AtomicBool::new(false));
    let third = Arc::new(AtomicBool::new(false));

    let mut race = WaitFirst::<&str, String>::new();
    let hook = CancelHook(first.clone());
    race.push(async move {
        let _hook = hook;
        sleep(Duration::from_secs(10)).await;
        Ok("ntp")
    });
    race.push(async {
        sleep(Duration::from_millis(50)).await;
        Ok("mqtt")
    });
    let hook = CancelHook(third.clone());
    race.spawn(async move {
        let _hook = hook;
        sleep(Duration::from_secs(10)).await;
        Err("wifi down".to_string())
    });

    assert_eq!(race.len(), 3);
    assert_eq!(race.wait().await, Ok((1, "mqtt")));
    assert!(first.load(Ordering::SeqCst));
    assert!(third.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_bus_wait_against_timer() {
    let bus = EventBus::new();

    let publisher = bus.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(200)).await;
        publisher.publish("wifi.connected", "10.0.0.7");
    });

    let waited = race::timeout(Duration::from_secs(1), async {
        bus.wait("wifi.connected").await.ok_or("bus closed")
    })
    .await
    .unwrap();
    assert_eq!(waited.data::<&str>(), Some(&"10.0.0.7"));
    assert_eq!(bus.subscriber_count("wifi.connected"), 0);

    let missed = race::timeout(Duration::from_millis(300), async {
        bus.wait("wifi.connected").await.ok_or("bus closed")
    })
    .await;
    assert_eq!(missed.unwrap_err().as_label(), "race_timeout");
    assert_eq!(bus.subscriber_count("wifi.connected"), 0);
}

#[tokio::test]
async fn test_failed_winner_reports_its_index() {
    let mut race = WaitFirst::<(), &str>::new();
    race.push(futures::future::pending());
    race.push(async { Err("sensor not answering") });

    match race.wait().await {
        Err(RaceError::Failed { index, error }) => {
            assert_eq!(index, 1);
            assert_eq!(error, "sensor not answering");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
