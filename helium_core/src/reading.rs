//! One sampled measurement with its derived volume and percentage.

use chrono::{DateTime, Utc};
use std::fmt;

/// Timestamp layout shared by log records and messages.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Immutable sample produced by the driver adapter.
///
/// `percentage` is undefined when the volume is at or below the empty mark of
/// the calibration table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub raw_level_cm: f64,
    pub volume_l: f64,
    pub percentage: Option<f64>,
}

impl Reading {
    /// Log record: `timestamp, rawLevel, volume, percentage`.
    pub fn to_record(&self) -> String {
        let pct = match self.percentage {
            Some(p) => p.to_string(),
            None => "nan".to_string(),
        };
        format!(
            "{}, {}, {}, {}",
            self.timestamp.format(TIME_FORMAT),
            self.raw_level_cm,
            self.volume_l,
            pct
        )
    }

    /// Whether `other` carries the same volume.
    ///
    /// `tolerance_l == 0.0` is exact equality; a positive tolerance treats
    /// differences inside the band as unchanged.
    pub fn volume_unchanged(&self, other: &Reading, tolerance_l: f64) -> bool {
        if tolerance_l > 0.0 {
            (self.volume_l - other.volume_l).abs() <= tolerance_l
        } else {
            self.volume_l == other.volume_l
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} cm, {:.2} L, ",
            self.timestamp.format(TIME_FORMAT),
            self.raw_level_cm,
            self.volume_l
        )?;
        match self.percentage {
            Some(p) => write!(f, "{p:.2} %"),
            None => write!(f, "nan %"),
        }
    }
}
