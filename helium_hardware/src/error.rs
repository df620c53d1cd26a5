use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("sensor fault: {0}")]
    Fault(String),
    #[error("sensor not responding")]
    Timeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
