//! Monitor wiring: startup, command replies and orderly close.

use helium_core::command::{Command, NOT_SUBSCRIBED, NotifyArgs};
use helium_core::mocks::{RecordingMessenger, ScriptedSensor};
use helium_core::{Calibration, ChangeLogCfg, Monitor, MonitorCfg, SubscriberSettings};
use helium_traits::SubscriberId;
use helium_traits::clock::MonotonicClock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn start(tmp: &TempDir, messenger: &RecordingMessenger) -> Monitor {
    let cfg = MonitorCfg {
        name: "test dewar".to_string(),
        poll_rate: Duration::from_millis(10),
        changelog: ChangeLogCfg {
            dir: tmp.path().to_path_buf(),
            refresh_rate: Duration::from_millis(10),
            ..ChangeLogCfg::default()
        },
        notifier: SubscriberSettings {
            poll_interval: Duration::from_millis(5),
            ..SubscriberSettings::default()
        },
    };
    Monitor::start(
        ScriptedSensor::new([Ok(66.0)]),
        Calibration::default(),
        Arc::new(messenger.clone()),
        cfg,
        MonotonicClock::new(),
    )
    .unwrap()
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn notify(args: NotifyArgs) -> Command {
    Command::Notify(args)
}

#[test]
fn starts_with_a_reading_and_writes_the_log() {
    let tmp = TempDir::new().unwrap();
    let messenger = RecordingMessenger::new();
    let mut m = start(&tmp, &messenger);
    assert_eq!(m.name(), "test dewar");
    assert_eq!(m.latest().volume_l, 37.5);
    assert!(m.is_running());
    assert!(wait_until(Duration::from_secs(2), || {
        std::fs::read_dir(tmp.path()).map(|d| d.count()).unwrap_or(0) == 1
    }));
    m.close();
    assert!(!m.is_running());
}

#[test]
fn status_command_reports_current_reading() {
    let tmp = TempDir::new().unwrap();
    let m = start(&tmp, &RecordingMessenger::new());
    let reply = m.handle(&SubscriberId::from("5"), &Command::Status);
    assert!(reply.contains("66 cm"), "{reply}");
    assert!(reply.contains("37.50 L"), "{reply}");
}

#[test]
fn help_command_lists_commands() {
    let tmp = TempDir::new().unwrap();
    let m = start(&tmp, &RecordingMessenger::new());
    let reply = m.handle(&SubscriberId::from("5"), &Command::Help);
    assert!(reply.contains("/notify"));
    assert!(reply.contains("/status"));
}

#[test]
fn notify_enables_and_configures_a_subscriber() {
    let tmp = TempDir::new().unwrap();
    let messenger = RecordingMessenger::new();
    let m = start(&tmp, &messenger);
    let who = SubscriberId::from(62579439_i64);

    let reply = m.handle(
        &who,
        &notify(NotifyArgs {
            notifications: Some(true),
            alarm_level_l: Some(40.0),
            ..Default::default()
        }),
    );
    assert!(reply.starts_with("Notifications started for 62579439."), "{reply}");
    assert!(reply.contains("level: 40 L"), "{reply}");
    assert!(wait_until(Duration::from_secs(2), || messenger.count() >= 1));
    assert_eq!(m.notifiers().len(), 1);

    let reply = m.handle(
        &who,
        &notify(NotifyArgs {
            notifications: Some(false),
            ..Default::default()
        }),
    );
    assert!(reply.starts_with("Notifications stopped for 62579439."), "{reply}");
    assert!(reply.ends_with(NOT_SUBSCRIBED), "{reply}");
    assert!(m.notifiers().is_empty());
}

#[test]
fn notify_settings_without_subscription_are_refused() {
    let tmp = TempDir::new().unwrap();
    let m = start(&tmp, &RecordingMessenger::new());
    let reply = m.handle(
        &SubscriberId::from("9"),
        &notify(NotifyArgs {
            alarm: Some(false),
            ..Default::default()
        }),
    );
    assert!(reply.contains("Error: unknown subscriber 9"), "{reply}");
    assert!(reply.ends_with(NOT_SUBSCRIBED));
}

#[test]
fn empty_notify_shows_usage() {
    let tmp = TempDir::new().unwrap();
    let m = start(&tmp, &RecordingMessenger::new());
    let reply = m.handle(&SubscriberId::from("9"), &notify(NotifyArgs::default()));
    assert!(reply.starts_with("/notify arguments"), "{reply}");
}

#[test]
fn close_stops_everything_and_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let messenger = RecordingMessenger::new();
    let mut m = start(&tmp, &messenger);
    for who in ["1", "2", "3"] {
        m.notifiers().set_enabled(&SubscriberId::from(who), true).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || messenger.count() == 3));

    let t0 = Instant::now();
    m.close();
    assert!(t0.elapsed() < Duration::from_secs(2));
    assert!(m.notifiers().is_empty());
    assert!(!m.is_running());
    m.close();

    let sent = messenger.count();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(messenger.count(), sent);
}
