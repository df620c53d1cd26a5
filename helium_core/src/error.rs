use helium_traits::SubscriberId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    /// Transient: the previous reading stays valid and the next cycle retries.
    #[error("sensor read failed: {0}")]
    Read(String),
    #[error("level {level_cm} cm outside calibrated range [{min_cm}, {max_cm}] cm")]
    OutOfRange {
        level_cm: f64,
        min_cm: f64,
        max_cm: f64,
    },
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("unknown subscriber {0}; enable notifications first")]
    UnknownSubscriber(SubscriberId),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to spawn worker {name}: {reason}")]
    Spawn { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MonitorError>;
