//! Maps `Box<dyn Error>` from the sensor trait boundary to `MonitorError`.
//!
//! `LevelSensor` uses `Box<dyn Error + Send + Sync>` for flexibility; this
//! module converts those to the typed enum, with an optional feature-gated
//! path for `helium_hardware::HwError` downcasting.

use crate::error::MonitorError;

/// Map a sensor error to a typed `MonitorError::Read`.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> MonitorError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<helium_hardware::error::HwError>() {
            return match hw {
                helium_hardware::error::HwError::Timeout => {
                    MonitorError::Read("sensor timeout".to_string())
                }
                other => MonitorError::Read(format!("hardware: {other}")),
            };
        }
    }

    MonitorError::Read(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_keep_their_message() {
        let e = std::io::Error::other("serial port gone");
        assert_eq!(
            map_sensor_error(&e),
            MonitorError::Read("serial port gone".to_string())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hardware_timeout_is_recognised() {
        let e = helium_hardware::error::HwError::Timeout;
        assert_eq!(
            map_sensor_error(&e),
            MonitorError::Read("sensor timeout".to_string())
        );
    }
}
