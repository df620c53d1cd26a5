//! Runtime configuration for the monitor's workers.
//!
//! Separate from the TOML schema in `helium_config`; see `conversions` for the
//! mapping.

use crate::notifier::SubscriberSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Change-log writer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLogCfg {
    /// Directory holding the per-day files.
    pub dir: PathBuf,
    /// Files are named `<prefix>_<YYYY-MM-DD>.csv`.
    pub prefix: String,
    /// Writer cadence.
    pub refresh_rate: Duration,
    /// Volume differences up to this many litres count as unchanged. 0.0 = exact.
    pub change_tolerance_l: f64,
    /// Header lines written as `# <line>` at the top of each new file.
    pub header: Vec<String>,
}

impl Default for ChangeLogCfg {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("helium_log"),
            prefix: "helium".to_string(),
            refresh_rate: Duration::from_secs(60),
            change_tolerance_l: 0.0,
            header: vec!["time (UTC), fill height (cm), volume (L), percentage (%)".to_string()],
        }
    }
}

/// Everything `Monitor::start` needs besides the collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorCfg {
    /// Instrument name for logs and replies.
    pub name: String,
    /// Poller cadence.
    pub poll_rate: Duration,
    pub changelog: ChangeLogCfg,
    /// Settings given to newly enabled subscribers.
    pub notifier: SubscriberSettings,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            name: "helium".to_string(),
            poll_rate: Duration::from_secs(60),
            changelog: ChangeLogCfg::default(),
            notifier: SubscriberSettings::default(),
        }
    }
}
