//! Per-subscriber notification workers.
//!
//! The registry maps each enabled subscriber id to one running worker. A
//! worker wakes every `poll_interval`, and once `refresh_rate` has elapsed
//! since its last message it sends the latest reading: audible when the alarm
//! is on and the volume is at or below the alarm level, silent otherwise.
//! Settings are shared with the running worker and picked up on its next
//! tick, so reconfiguring never restarts a worker.
//!
//! Each id owns a slot. Disable takes the worker out of its slot and joins it
//! without holding the registry lock, so a slow send for one subscriber never
//! stalls commands for another. The slot stays registered until the join is
//! done, and a re-enable of the same id waits for it. Settings changes wake
//! the worker so a shorter interval applies at once.
use crate::error::{MonitorError, Result};
use crate::poller::ReadingSource;
use crate::reading::Reading;
use crate::util::{MIN_TICK, lock};
use crate::worker::{StopSignal, Worker};
use crossbeam_channel as xch;
use helium_traits::clock::Clock;
use helium_traits::{Messenger, SubscriberId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Live settings of one subscriber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriberSettings {
    pub notifications_enabled: bool,
    pub alarm_enabled: bool,
    /// Minimum time between two messages.
    pub refresh_rate: Duration,
    /// Messages are audible at or below this volume when the alarm is on.
    pub alarm_level_l: f64,
    /// How often the worker checks whether a message is due.
    pub poll_interval: Duration,
}

impl Default for SubscriberSettings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            alarm_enabled: true,
            refresh_rate: Duration::from_secs(3600),
            alarm_level_l: 20.0,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl SubscriberSettings {
    pub fn is_audible(&self, reading: &Reading) -> bool {
        self.alarm_enabled && reading.volume_l <= self.alarm_level_l
    }
}

/// Snapshot of a subscriber for status replies.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberStatus {
    pub id: SubscriberId,
    pub settings: SubscriberSettings,
    pub messages_sent: u64,
}

impl fmt::Display for SubscriberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        write!(
            f,
            "subscriber: {}, notifications: {}, alarm: {}, refresh_rate: {} s, level: {} L, poll_interval: {} s, sent: {}",
            self.id,
            s.notifications_enabled,
            s.alarm_enabled,
            s.refresh_rate.as_secs_f64(),
            s.alarm_level_l,
            s.poll_interval.as_secs_f64(),
            self.messages_sent
        )
    }
}

/// Result of `set_enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enablement {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
}

struct Slot {
    settings: Arc<Mutex<SubscriberSettings>>,
    sent: Arc<AtomicU64>,
    wake: xch::Sender<()>,
    /// `None` once a disable has taken the worker out.
    worker: Mutex<Option<Worker>>,
    /// Held by disable from taking the worker until the slot is unregistered.
    teardown: Mutex<()>,
}

impl Slot {
    fn is_active(&self) -> bool {
        lock(&self.worker).is_some()
    }

    fn status(&self, id: &SubscriberId) -> SubscriberStatus {
        SubscriberStatus {
            id: id.clone(),
            settings: *lock(&self.settings),
            messages_sent: self.sent.load(Ordering::Relaxed),
        }
    }
}

type SharedClock = Arc<dyn Clock + Send + Sync>;

pub struct NotifierRegistry {
    source: Arc<dyn ReadingSource>,
    messenger: Arc<dyn Messenger>,
    defaults: SubscriberSettings,
    clock: SharedClock,
    slots: Mutex<HashMap<SubscriberId, Arc<Slot>>>,
}

impl NotifierRegistry {
    pub fn new<C>(
        source: Arc<dyn ReadingSource>,
        messenger: Arc<dyn Messenger>,
        defaults: SubscriberSettings,
        clock: C,
    ) -> Self
    where
        C: Clock + Send + Sync + 'static,
    {
        Self {
            source,
            messenger,
            defaults,
            clock: Arc::new(clock),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &SubscriberSettings {
        &self.defaults
    }

    /// Enable starts a worker for an unknown id; disable stops and removes it.
    /// Both directions are idempotent. Disable returns after the worker has
    /// exited; an enable racing it for the same id waits for that exit.
    pub fn set_enabled(&self, id: &SubscriberId, enabled: bool) -> Result<Enablement> {
        if enabled {
            self.enable(id)
        } else {
            Ok(self.disable(id))
        }
    }

    fn enable(&self, id: &SubscriberId) -> Result<Enablement> {
        loop {
            let mut slots = lock(&self.slots);
            let Some(slot) = slots.get(id).cloned() else {
                let slot = Arc::new(self.spawn_slot(id.clone())?);
                slots.insert(id.clone(), slot);
                tracing::info!(subscriber = %id, "notifications enabled");
                return Ok(Enablement::Started);
            };
            drop(slots);
            let _pending = lock(&slot.teardown);
            if slot.is_active() {
                return Ok(Enablement::AlreadyRunning);
            }
            // A disable finished under our feet; its slot is gone now.
        }
    }

    fn disable(&self, id: &SubscriberId) -> Enablement {
        let Some(slot) = lock(&self.slots).get(id).cloned() else {
            return Enablement::NotRunning;
        };
        let _teardown = lock(&slot.teardown);
        let taken = lock(&slot.worker).take();
        let outcome = match taken {
            Some(mut worker) => {
                worker.stop();
                Enablement::Stopped
            }
            None => Enablement::NotRunning,
        };
        let mut slots = lock(&self.slots);
        if slots.get(id).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
            slots.remove(id);
        }
        drop(slots);
        if outcome == Enablement::Stopped {
            tracing::info!(subscriber = %id, "notifications disabled");
        }
        outcome
    }

    pub fn set_alarm_enabled(
        &self,
        id: &SubscriberId,
        enabled: bool,
    ) -> Result<SubscriberSettings> {
        self.update(id, |s| s.alarm_enabled = enabled)
    }

    pub fn set_refresh_rate(
        &self,
        id: &SubscriberId,
        refresh_rate: Duration,
    ) -> Result<SubscriberSettings> {
        self.update(id, |s| s.refresh_rate = refresh_rate)
    }

    pub fn set_alarm_level(
        &self,
        id: &SubscriberId,
        alarm_level_l: f64,
    ) -> Result<SubscriberSettings> {
        if !alarm_level_l.is_finite() {
            return Err(MonitorError::Config(format!(
                "alarm level must be finite, got {alarm_level_l}"
            )));
        }
        self.update(id, |s| s.alarm_level_l = alarm_level_l)
    }

    /// The worker is woken, so a shorter interval applies immediately rather
    /// than after the old one runs out.
    pub fn set_poll_interval(
        &self,
        id: &SubscriberId,
        poll_interval: Duration,
    ) -> Result<SubscriberSettings> {
        if poll_interval.is_zero() {
            return Err(MonitorError::Config("poll interval must be > 0".to_string()));
        }
        self.update(id, |s| s.poll_interval = poll_interval)
    }

    fn update(
        &self,
        id: &SubscriberId,
        f: impl FnOnce(&mut SubscriberSettings),
    ) -> Result<SubscriberSettings> {
        let slot = self
            .active_slot(id)
            .ok_or_else(|| MonitorError::UnknownSubscriber(id.clone()))?;
        let updated = {
            let mut settings = lock(&slot.settings);
            f(&mut settings);
            *settings
        };
        // A full channel already holds a pending wake.
        let _ = slot.wake.try_send(());
        tracing::info!(subscriber = %id, settings = ?updated, "subscriber updated");
        Ok(updated)
    }

    fn active_slot(&self, id: &SubscriberId) -> Option<Arc<Slot>> {
        let slot = lock(&self.slots).get(id).cloned()?;
        slot.is_active().then_some(slot)
    }

    fn active_slots(&self) -> Vec<(SubscriberId, Arc<Slot>)> {
        let snapshot: Vec<_> = lock(&self.slots)
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect();
        let mut active: Vec<_> = snapshot.into_iter().filter(|(_, s)| s.is_active()).collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }

    pub fn status(&self, id: &SubscriberId) -> Option<SubscriberStatus> {
        self.active_slot(id).map(|slot| slot.status(id))
    }

    /// Status of every active subscriber, ordered by id.
    pub fn statuses(&self) -> Vec<SubscriberStatus> {
        self.active_slots()
            .iter()
            .map(|(id, slot)| slot.status(id))
            .collect()
    }

    /// Active ids in sorted order. Subscribers being disabled are left out.
    pub fn ids(&self) -> Vec<SubscriberId> {
        self.active_slots().into_iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.active_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Workers whose thread is still alive.
    pub fn running_workers(&self) -> usize {
        self.active_slots()
            .iter()
            .filter(|(_, slot)| lock(&slot.worker).as_ref().is_some_and(Worker::is_running))
            .count()
    }

    /// Disable every subscriber, repeating until none is left. Returns how
    /// many workers this call stopped.
    pub fn disable_all(&self) -> usize {
        let mut stopped = 0;
        loop {
            let ids = self.ids();
            if ids.is_empty() {
                break;
            }
            for id in ids {
                if self.disable(&id) == Enablement::Stopped {
                    stopped += 1;
                }
            }
        }
        stopped
    }

    fn spawn_slot(&self, id: SubscriberId) -> Result<Slot> {
        let settings = Arc::new(Mutex::new(self.defaults));
        let sent = Arc::new(AtomicU64::new(0));
        let (wake, wake_rx) = xch::bounded(1);
        let name = format!("notifier-{id}");
        let job = NotifyJob {
            id,
            settings: settings.clone(),
            sent: sent.clone(),
            wake: wake_rx,
            source: self.source.clone(),
            messenger: self.messenger.clone(),
            clock: self.clock.clone(),
        };
        let worker = Worker::spawn(name.clone(), move |stop| job.run(&stop)).map_err(|e| {
            MonitorError::Spawn {
                name,
                reason: e.to_string(),
            }
        })?;
        Ok(Slot {
            settings,
            sent,
            wake,
            worker: Mutex::new(Some(worker)),
            teardown: Mutex::new(()),
        })
    }
}

impl Drop for NotifierRegistry {
    fn drop(&mut self) {
        self.disable_all();
    }
}

/// State moved into one subscriber's thread.
struct NotifyJob {
    id: SubscriberId,
    settings: Arc<Mutex<SubscriberSettings>>,
    sent: Arc<AtomicU64>,
    wake: xch::Receiver<()>,
    source: Arc<dyn ReadingSource>,
    messenger: Arc<dyn Messenger>,
    clock: SharedClock,
}

impl NotifyJob {
    fn run(self, stop: &StopSignal) {
        tracing::info!(subscriber = %self.id, "notifier started");
        // Never notified: the first tick is due immediately.
        let mut last_notified: Option<Instant> = None;
        loop {
            if stop.is_requested() {
                break;
            }
            let settings = *lock(&self.settings);
            let due = last_notified
                .is_none_or(|t| self.clock.elapsed_since(t) >= settings.refresh_rate);
            if due {
                last_notified = Some(self.clock.now());
                self.notify(&settings);
            }
            if stop.wait_or_wake(&self.wake, settings.poll_interval.max(MIN_TICK)) {
                break;
            }
        }
        tracing::info!(subscriber = %self.id, "notifier stopped");
    }

    fn notify(&self, settings: &SubscriberSettings) {
        let reading = self.source.latest();
        let audible = settings.is_audible(&reading);
        let text = reading.to_string();
        match self.messenger.send_message(&self.id, &text, audible) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                tracing::info!(subscriber = %self.id, audible, "{text}");
            }
            Err(e) => {
                tracing::warn!(subscriber = %self.id, error = %e, "notification not delivered");
            }
        }
    }
}
