pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::fmt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A level meter that reports the raw fill height in centimetres.
pub trait LevelSensor {
    fn read_level(&mut self) -> Result<f64, BoxError>;
}

impl<T: LevelSensor + ?Sized> LevelSensor for Box<T> {
    fn read_level(&mut self) -> Result<f64, BoxError> {
        (**self).read_level()
    }
}

/// Outbound message primitive provided by the chat transport.
///
/// `audible = false` asks the transport to deliver quietly.
pub trait Messenger: Send + Sync {
    fn send_message(
        &self,
        recipient: &SubscriberId,
        text: &str,
        audible: bool,
    ) -> Result<(), BoxError>;
}

/// Opaque recipient identity (a chat id for most transports).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SubscriberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for SubscriberId {
    fn from(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }
}
