//! Level sensor backends.
//!
//! Only simulated and fixed backends live here; a real instrument driver plugs
//! in through `helium_traits::LevelSensor`. Backends are chosen from an
//! enumerated [`SensorKind`] via [`make_sensor`].
pub mod error;
pub mod util;

use crate::error::HwError;
use crate::util::XorShift64;
use helium_traits::{BoxError, LevelSensor};

/// Full dewar fill height in cm for the default simulation.
pub const DEFAULT_MAX_LEVEL_CM: f64 = 122.3;
/// Below this level the simulated dewar is "refilled".
const REFILL_BELOW_CM: f64 = 10.0;
/// Per-read probability of a spontaneous refill.
const REFILL_CHANCE: f64 = 0.005;

/// Simulated helium level meter.
///
/// The level drains by a random amount below 1 cm per read and jumps to a
/// random fresh level when it runs low or on a rare spontaneous refill.
/// Optionally fails a fraction of reads to exercise error paths.
pub struct SimulatedSensor {
    rng: XorShift64,
    level_cm: f64,
    max_level_cm: f64,
    fault_rate: f64,
}

impl SimulatedSensor {
    pub fn new(seed: u64) -> Self {
        let mut rng = XorShift64::new(seed);
        let level_cm = rng.next_unit() * DEFAULT_MAX_LEVEL_CM;
        SimulatedSensor {
            rng,
            level_cm,
            max_level_cm: DEFAULT_MAX_LEVEL_CM,
            fault_rate: 0.0,
        }
    }

    pub fn with_max_level(mut self, max_level_cm: f64) -> Self {
        self.max_level_cm = max_level_cm;
        self.level_cm = self.level_cm.min(max_level_cm);
        self
    }

    /// Fail roughly `rate` of all reads (0.0 disables).
    pub fn with_fault_rate(mut self, rate: f64) -> Self {
        self.fault_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn level_cm(&self) -> f64 {
        self.level_cm
    }
}

impl LevelSensor for SimulatedSensor {
    fn read_level(&mut self) -> Result<f64, BoxError> {
        if self.fault_rate > 0.0 && self.rng.next_unit() < self.fault_rate {
            tracing::debug!("simulated sensor fault");
            return Err(Box::new(HwError::Timeout));
        }
        let r = self.rng.next_unit();
        if r >= 1.0 - REFILL_CHANCE || self.level_cm < REFILL_BELOW_CM {
            self.level_cm = self.rng.next_unit() * self.max_level_cm;
        } else {
            self.level_cm = (self.level_cm - r).max(0.0);
        }
        tracing::trace!(level_cm = self.level_cm, "simulated level");
        Ok(self.level_cm)
    }
}

/// Sensor that always reports the same level; for dry runs and bench setups.
pub struct FixedSensor {
    level_cm: f64,
}

impl FixedSensor {
    pub fn new(level_cm: f64) -> Self {
        Self { level_cm }
    }
}

impl LevelSensor for FixedSensor {
    fn read_level(&mut self) -> Result<f64, BoxError> {
        if !self.level_cm.is_finite() {
            return Err(Box::new(HwError::Fault(format!(
                "non-finite level {}",
                self.level_cm
            ))));
        }
        Ok(self.level_cm)
    }
}

/// Available sensor backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorKind {
    Simulated { seed: u64, fault_rate: f64 },
    Fixed { level_cm: f64 },
}

/// Build the backend for `kind`.
pub fn make_sensor(kind: SensorKind) -> Box<dyn LevelSensor + Send> {
    match kind {
        SensorKind::Simulated { seed, fault_rate } => {
            tracing::info!(seed, fault_rate, "using simulated level sensor");
            Box::new(SimulatedSensor::new(seed).with_fault_rate(fault_rate))
        }
        SensorKind::Fixed { level_cm } => {
            tracing::info!(level_cm, "using fixed level sensor");
            Box::new(FixedSensor::new(level_cm))
        }
    }
}
