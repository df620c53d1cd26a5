use crate::calibration::Calibration;
use crate::error::{MonitorError, Result};
use crate::hw_error::map_sensor_error;
use crate::reading::Reading;
use chrono::Utc;
use helium_traits::LevelSensor;

/// Sensor plus calibration: turns a raw level into a timestamped `Reading`.
pub struct DriverAdapter<S> {
    sensor: S,
    calibration: Calibration,
}

impl<S: LevelSensor> DriverAdapter<S> {
    pub fn new(sensor: S, calibration: Calibration) -> Self {
        Self {
            sensor,
            calibration,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn read_status(&mut self) -> Result<Reading> {
        let level_cm = self
            .sensor
            .read_level()
            .map_err(|e| map_sensor_error(e.as_ref()))?;
        if !level_cm.is_finite() {
            return Err(MonitorError::Read(format!("non-finite level {level_cm}")));
        }
        let reading = self.calibration.reading_at(level_cm, Utc::now())?;
        tracing::debug!(%reading, "level reading");
        Ok(reading)
    }
}
