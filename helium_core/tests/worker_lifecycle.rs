//! Worker thread lifecycle: prompt stop, idempotent stop, no leaked threads.

use helium_core::worker::Worker;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn looping_worker(name: &str, ticks: Arc<AtomicUsize>, tick: Duration) -> Worker {
    Worker::spawn(name, move |stop| {
        while !stop.wait(tick) {
            ticks.fetch_add(1, Ordering::SeqCst);
        }
    })
    .unwrap()
}

#[test]
fn stop_joins_and_is_idempotent() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let mut w = looping_worker("lifecycle", ticks.clone(), Duration::from_millis(5));
    std::thread::sleep(Duration::from_millis(30));
    assert!(w.is_running());

    assert!(w.stop());
    assert!(!w.is_running());
    let after = ticks.load(Ordering::SeqCst);
    assert!(after > 0);

    // Second stop is a no-op and the loop stays dead.
    assert!(!w.stop());
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(ticks.load(Ordering::SeqCst), after);
}

#[test]
fn stop_is_prompt_with_long_waits() {
    // The loop sleeps for an hour per tick; stop must still return quickly.
    let ticks = Arc::new(AtomicUsize::new(0));
    let mut w = looping_worker("long-wait", ticks, Duration::from_secs(3600));
    std::thread::sleep(Duration::from_millis(10));

    let start = Instant::now();
    assert!(w.stop());
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "stop took {:?}",
        start.elapsed()
    );
}

#[test]
fn drop_stops_the_thread() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let w = looping_worker("dropped", ticks.clone(), Duration::from_millis(2));
    std::thread::sleep(Duration::from_millis(20));
    drop(w);
    let after = ticks.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(ticks.load(Ordering::SeqCst), after);
}

#[test]
fn request_stop_is_sticky() {
    // A stop requested before the loop reaches its first wait is not lost.
    let (seen_tx, seen_rx) = std::sync::mpsc::channel();
    let mut w = Worker::spawn("sticky", move |stop| {
        std::thread::sleep(Duration::from_millis(20));
        let requested = stop.is_requested();
        let woke = stop.wait(Duration::from_secs(3600));
        seen_tx.send((requested, woke)).unwrap();
    })
    .unwrap();
    w.request_stop();
    let start = Instant::now();
    assert!(w.stop());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(seen_rx.try_recv(), Ok((true, true)));
}

#[test]
fn wake_interrupts_a_long_wait_without_stopping() {
    let (wake_tx, wake_rx) = crossbeam_channel::bounded::<()>(1);
    let (seen_tx, seen_rx) = std::sync::mpsc::channel();
    let mut w = Worker::spawn("wakeable", move |stop| {
        while !stop.wait_or_wake(&wake_rx, Duration::from_secs(3600)) {
            seen_tx.send(()).unwrap();
        }
    })
    .unwrap();
    wake_tx.send(()).unwrap();
    assert_eq!(seen_rx.recv_timeout(Duration::from_secs(2)), Ok(()));
    assert!(w.is_running());

    // A dropped wake sender leaves the stop channel in charge.
    drop(wake_tx);
    let start = Instant::now();
    assert!(w.stop());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn many_workers_created_and_destroyed() {
    for i in 0..20 {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut w = looping_worker(&format!("churn-{i}"), ticks, Duration::from_millis(1));
        assert_eq!(w.name(), format!("churn-{i}"));
        std::thread::sleep(Duration::from_millis(2));
        assert!(w.stop());
    }
}

#[test]
fn panicking_body_is_reported_not_propagated() {
    let mut w = Worker::spawn("panics", |_stop| panic!("boom")).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    assert!(!w.is_running());
    assert!(w.stop());
}
