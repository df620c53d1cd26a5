//! Orchestrator wiring sensor -> poller -> {change log, notifiers}.
//!
//! Startup order is poller, change-log writer, then an empty notifier
//! registry. `close()` tears down in reverse and returns only once every
//! worker has exited.
use crate::adapter::DriverAdapter;
use crate::calibration::Calibration;
use crate::changelog::ChangeLogWriter;
use crate::config::MonitorCfg;
use crate::error::Result;
use crate::notifier::NotifierRegistry;
use crate::poller::Poller;
use crate::reading::Reading;
use helium_traits::clock::Clock;
use helium_traits::{LevelSensor, Messenger};
use std::sync::Arc;

pub struct Monitor {
    name: String,
    poller: Poller,
    writer: ChangeLogWriter,
    notifiers: NotifierRegistry,
    closed: bool,
}

impl Monitor {
    pub fn start<S, C>(
        sensor: S,
        calibration: Calibration,
        messenger: Arc<dyn Messenger>,
        cfg: MonitorCfg,
        clock: C,
    ) -> Result<Self>
    where
        S: LevelSensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(clock);
        let MonitorCfg {
            name,
            poll_rate,
            changelog,
            notifier,
        } = cfg;

        let poller = Poller::start(
            DriverAdapter::new(sensor, calibration),
            poll_rate,
            clock.clone(),
        )?;
        // On error the poller is dropped here, which stops it.
        let writer = ChangeLogWriter::start(poller.cache(), changelog, clock.clone())?;
        let notifiers = NotifierRegistry::new(Arc::new(poller.cache()), messenger, notifier, clock);

        tracing::info!(monitor = %name, reading = %poller.latest(), "monitor started");
        Ok(Self {
            name,
            poller,
            writer,
            notifiers,
            closed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latest(&self) -> Reading {
        self.poller.latest()
    }

    /// Human-readable current reading.
    pub fn status_text(&self) -> String {
        self.latest().to_string()
    }

    pub fn notifiers(&self) -> &NotifierRegistry {
        &self.notifiers
    }

    /// True while the poller and change-log loops are alive.
    pub fn is_running(&self) -> bool {
        self.poller.is_running() && self.writer.is_running()
    }

    /// Disable all subscribers, stop the change log, stop the poller.
    /// Idempotent; also run on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let subscribers = self.notifiers.disable_all();
        self.writer.stop();
        self.poller.stop();
        self.closed = true;
        tracing::info!(monitor = %self.name, subscribers, "monitor closed");
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.close();
    }
}
