#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Helium level monitoring (hardware-agnostic).
//!
//! All hardware access goes through `helium_traits::LevelSensor`, all outbound
//! messages through `helium_traits::Messenger`.
//!
//! ## Architecture
//!
//! - **Calibration**: piecewise-linear fill height to volume (`calibration`)
//! - **Adapter**: one sensor read into a timestamped `Reading` (`adapter`)
//! - **Poller**: background refresh of the shared cached reading (`poller`)
//! - **Change log**: per-day CSV files, appended on change (`changelog`)
//! - **Notifiers**: one worker per subscriber with live settings (`notifier`)
//! - **Monitor**: wires the above together and tears them down (`monitor`)
//!
//! Every background loop is a `worker::Worker`: one named thread, a sticky
//! stop request and a join as acknowledgement.

pub mod adapter;
pub mod calibration;
pub mod changelog;
pub mod command;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod notifier;
pub mod poller;
pub mod reading;
pub mod util;
pub mod worker;

pub use adapter::DriverAdapter;
pub use calibration::Calibration;
pub use changelog::{ChangeLog, ChangeLogWriter, CycleOutcome};
pub use command::{Command, NotifyArgs};
pub use config::{ChangeLogCfg, MonitorCfg};
pub use error::{MonitorError, Result};
pub use monitor::Monitor;
pub use notifier::{Enablement, NotifierRegistry, SubscriberSettings, SubscriberStatus};
pub use poller::{CachedStatus, Poller, ReadingCache, ReadingSource};
pub use reading::Reading;
