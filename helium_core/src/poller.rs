//! Background level poller maintaining the live cached reading.
//!
//! Spawns a thread that owns the driver adapter and replaces the cached
//! reading whenever a refresh is due. The cache is seeded synchronously at
//! start so `latest()` is always defined. A failed read keeps the previous
//! reading; the loop never stops on driver errors.
use crate::adapter::DriverAdapter;
use crate::error::{MonitorError, Result};
use crate::reading::Reading;
use crate::util::tick_for;
use crate::worker::Worker;
use helium_traits::LevelSensor;
use helium_traits::clock::Clock;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Most recent reading plus when it was fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedStatus {
    pub reading: Reading,
    pub fetched_at: Instant,
}

/// Read access to the current reading.
pub trait ReadingSource: Send + Sync {
    fn latest(&self) -> Reading;
}

impl<T: ReadingSource + ?Sized> ReadingSource for Arc<T> {
    fn latest(&self) -> Reading {
        (**self).latest()
    }
}

/// Cloneable read handle on the poller's cache.
///
/// The whole `CachedStatus` is replaced under the write lock, so readers see
/// either the old or the new value, never a mix.
#[derive(Debug, Clone)]
pub struct ReadingCache {
    inner: Arc<RwLock<CachedStatus>>,
}

impl ReadingCache {
    fn new(status: CachedStatus) -> Self {
        Self {
            inner: Arc::new(RwLock::new(status)),
        }
    }

    fn replace(&self, status: CachedStatus) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn status(&self) -> CachedStatus {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time since the cached reading was fetched.
    pub fn age(&self, clock: &impl Clock) -> Duration {
        clock.elapsed_since(self.status().fetched_at)
    }
}

impl ReadingSource for ReadingCache {
    fn latest(&self) -> Reading {
        self.status().reading
    }
}

pub struct Poller {
    cache: ReadingCache,
    refresh_rate: Duration,
    worker: Worker,
}

impl Poller {
    /// Seed the cache with one synchronous read, then start the refresh loop.
    pub fn start<S, C>(
        mut adapter: DriverAdapter<S>,
        refresh_rate: Duration,
        clock: C,
    ) -> Result<Self>
    where
        S: LevelSensor + Send + 'static,
        C: Clock + Send + 'static,
    {
        let seed = adapter.read_status()?;
        let seeded_at = clock.now();
        let cache = ReadingCache::new(CachedStatus {
            reading: seed,
            fetched_at: seeded_at,
        });
        let writer = cache.clone();
        let tick = tick_for(refresh_rate);

        let worker = Worker::spawn("level-poller", move |stop| {
            tracing::info!(refresh_s = refresh_rate.as_secs_f64(), "poller started");
            let mut last_refresh = seeded_at;
            let mut failures: u64 = 0;
            while !stop.wait(tick) {
                let now = clock.now();
                if now.saturating_duration_since(last_refresh) < refresh_rate {
                    continue;
                }
                last_refresh = now;
                match adapter.read_status() {
                    Ok(reading) => {
                        writer.replace(CachedStatus {
                            reading,
                            fetched_at: now,
                        });
                        if failures > 0 {
                            tracing::info!(failures, "sensor recovered");
                        }
                        failures = 0;
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(error = %e, failures, "level read failed; keeping previous reading");
                    }
                }
            }
            tracing::info!("poller stopped");
        })
        .map_err(|e| MonitorError::Spawn {
            name: "level-poller".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            cache,
            refresh_rate,
            worker,
        })
    }

    /// Latest successfully fetched reading; never blocks on the driver.
    pub fn latest(&self) -> Reading {
        self.cache.latest()
    }

    pub fn cache(&self) -> ReadingCache {
        self.cache.clone()
    }

    pub fn refresh_rate(&self) -> Duration {
        self.refresh_rate
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Stop the loop and wait for it to exit. Idempotent.
    pub fn stop(&mut self) -> bool {
        self.worker.stop()
    }
}
