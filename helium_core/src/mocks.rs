//! Test and helper mocks for helium_core

use crate::poller::ReadingSource;
use crate::reading::Reading;
use crate::util::lock;
use chrono::Utc;
use helium_traits::{BoxError, LevelSensor, Messenger, SubscriberId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Sensor replaying a script of levels and errors; the last entry repeats
/// once the script is exhausted.
pub struct ScriptedSensor {
    script: VecDeque<Result<f64, String>>,
    last: Result<f64, String>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Result<f64, String>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: Err("empty script".to_string()),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `read_level` calls.
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

impl LevelSensor for ScriptedSensor {
    fn read_level(&mut self) -> Result<f64, BoxError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last.clone().map_err(Into::into)
    }
}

/// Build a reading stamped now, with percentage left undefined.
pub fn reading_with_volume(volume_l: f64) -> Reading {
    Reading {
        timestamp: Utc::now(),
        raw_level_cm: volume_l,
        volume_l,
        percentage: None,
    }
}

/// Settable stand-in for the poller cache.
#[derive(Clone)]
pub struct SharedReading {
    inner: Arc<Mutex<Reading>>,
}

impl SharedReading {
    pub fn new(reading: Reading) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reading)),
        }
    }

    pub fn set(&self, reading: Reading) {
        *lock(&self.inner) = reading;
    }

    pub fn set_volume(&self, volume_l: f64) {
        self.set(reading_with_volume(volume_l));
    }
}

impl ReadingSource for SharedReading {
    fn latest(&self) -> Reading {
        *lock(&self.inner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub recipient: SubscriberId,
    pub text: String,
    pub audible: bool,
}

/// Messenger that records every message; can be switched to fail.
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    pub fn messages_for(&self, id: &SubscriberId) -> Vec<SentMessage> {
        lock(&self.sent)
            .iter()
            .filter(|m| &m.recipient == id)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        lock(&self.sent).len()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Messenger for RecordingMessenger {
    fn send_message(
        &self,
        recipient: &SubscriberId,
        text: &str,
        audible: bool,
    ) -> Result<(), BoxError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("transport unavailable".into());
        }
        lock(&self.sent).push(SentMessage {
            recipient: recipient.clone(),
            text: text.to_string(),
            audible,
        });
        Ok(())
    }
}
