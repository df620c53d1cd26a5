//! Fill height to volume conversion for a dewar.
//!
//! A piecewise-linear table of `(level_cm, volume_l)` points, strictly
//! increasing in level. Levels outside the table are rejected rather than
//! extrapolated; an over-range level usually means a broken probe.

use crate::error::{MonitorError, Result};
use crate::reading::Reading;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    points: Vec<(f64, f64)>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            points: helium_config::DEFAULT_CALIBRATION.to_vec(),
        }
    }
}

impl Calibration {
    pub fn from_points(points: Vec<(f64, f64)>) -> Result<Self> {
        helium_config::validate_points(&points)
            .map_err(|e| MonitorError::Config(e.to_string()))?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    fn first(&self) -> (f64, f64) {
        self.points[0]
    }

    fn last(&self) -> (f64, f64) {
        self.points[self.points.len() - 1]
    }

    /// Interpolated volume in litres for a fill height in cm.
    pub fn volume_at(&self, level_cm: f64) -> Result<f64> {
        let (min_cm, _) = self.first();
        let (max_cm, max_l) = self.last();
        if !level_cm.is_finite() || level_cm < min_cm || level_cm > max_cm {
            return Err(MonitorError::OutOfRange {
                level_cm,
                min_cm,
                max_cm,
            });
        }
        for seg in self.points.windows(2) {
            let (l0, v0) = seg[0];
            let (l1, v1) = seg[1];
            if level_cm >= l0 && level_cm < l1 {
                return Ok(v0 + (level_cm - l0) * (v1 - v0) / (l1 - l0));
            }
        }
        // level_cm == max_cm
        Ok(max_l)
    }

    /// Fill percentage relative to the full volume; undefined at or below the
    /// empty mark.
    pub fn percentage_of(&self, volume_l: f64) -> Option<f64> {
        let (_, empty_l) = self.first();
        let (_, full_l) = self.last();
        if volume_l <= empty_l || full_l <= 0.0 {
            None
        } else {
            Some(volume_l / full_l * 100.0)
        }
    }

    pub fn reading_at(&self, level_cm: f64, timestamp: DateTime<Utc>) -> Result<Reading> {
        let volume_l = self.volume_at(level_cm)?;
        Ok(Reading {
            timestamp,
            raw_level_cm: level_cm,
            volume_l,
            percentage: self.percentage_of(volume_l),
        })
    }
}
