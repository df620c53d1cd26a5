//! `From` implementations bridging `helium_config` types to `helium_core` types.

use crate::config::{ChangeLogCfg, MonitorCfg};
use crate::notifier::SubscriberSettings;
use crate::util::duration_from_secs;

// ── ChangeLogCfg ─────────────────────────────────────────────────────────────

impl From<&helium_config::ChangeLogCfg> for ChangeLogCfg {
    fn from(c: &helium_config::ChangeLogCfg) -> Self {
        Self {
            dir: c.path.clone(),
            prefix: c.prefix.clone(),
            refresh_rate: duration_from_secs(c.refresh_rate_s),
            change_tolerance_l: c.change_tolerance_l,
            header: c.header.clone(),
        }
    }
}

// ── SubscriberSettings ───────────────────────────────────────────────────────

impl From<&helium_config::NotifierCfg> for SubscriberSettings {
    fn from(c: &helium_config::NotifierCfg) -> Self {
        Self {
            notifications_enabled: true,
            alarm_enabled: c.alarm_enabled,
            refresh_rate: duration_from_secs(c.refresh_rate_s),
            alarm_level_l: c.alarm_level_l,
            poll_interval: duration_from_secs(c.poll_interval_s),
        }
    }
}

// ── MonitorCfg ───────────────────────────────────────────────────────────────

impl From<&helium_config::Config> for MonitorCfg {
    fn from(c: &helium_config::Config) -> Self {
        Self {
            name: c.name.clone(),
            poll_rate: duration_from_secs(c.driver.refresh_rate_s),
            changelog: (&c.changelog).into(),
            notifier: (&c.notifier).into(),
        }
    }
}
