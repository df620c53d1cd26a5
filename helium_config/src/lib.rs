#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration parsing for the helium monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration tables come either inline from `[calibration]` or from a CSV
//!   file with strict `level_cm,volume_l` headers.
use serde::Deserialize;
use serde::de::Deserializer;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::WrapErr;

/// Calibration CSV schema.
///
/// Expected headers:
/// level_cm,volume_l
///
/// Example:
/// level_cm,volume_l
/// 0,12.0
/// 66,37.5
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationRow {
    pub level_cm: f64,
    pub volume_l: f64,
}

/// Dewar "Scheer 2" with IVC: fill height (cm) to liquid volume (L).
pub const DEFAULT_CALIBRATION: [(f64, f64); 4] =
    [(0.0, 12.0), (66.0, 37.5), (119.0, 78.0), (122.3, 79.0)];

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Simulated,
    Fixed,
}

#[derive(Debug, Deserialize)]
pub struct DriverCfg {
    pub kind: DriverKind,
    /// Seconds between sensor reads.
    #[serde(default = "default_driver_refresh_s")]
    pub refresh_rate_s: f64,
    /// Level reported by the fixed backend.
    #[serde(default)]
    pub level_cm: Option<f64>,
    /// Seed of the simulated backend; derived from the wall clock when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Fraction of simulated reads that fail (0.0 disables).
    #[serde(default)]
    pub fault_rate: f64,
}

fn default_driver_refresh_s() -> f64 {
    60.0
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Accepts either:
    /// - array of tuples: [[0.0, 12.0], [66.0, 37.5], ...]
    /// - array of tables: [{ level_cm = 0.0, volume_l = 12.0 }, ...]
    #[serde(deserialize_with = "de_points")]
    pub points: Vec<(f64, f64)>,
    /// Optional CSV path; takes precedence over `points` when set.
    pub csv: Option<PathBuf>,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            points: DEFAULT_CALIBRATION.to_vec(),
            csv: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointToml {
    Tuple((f64, f64)),
    Table { level_cm: f64, volume_l: f64 },
}

fn de_points<'de, D>(deserializer: D) -> Result<Vec<(f64, f64)>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<PointToml> = Vec::deserialize(deserializer)?;
    Ok(items
        .into_iter()
        .map(|p| match p {
            PointToml::Tuple(t) => t,
            PointToml::Table { level_cm, volume_l } => (level_cm, volume_l),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChangeLogCfg {
    /// Directory holding the per-day files.
    pub path: PathBuf,
    /// File name prefix: `<prefix>_<YYYY-MM-DD>.csv`.
    pub prefix: String,
    /// Seconds between writer cycles.
    pub refresh_rate_s: f64,
    /// Volume differences up to this many litres count as unchanged (0 = exact).
    pub change_tolerance_l: f64,
    /// Header lines, each written as `# <line>`.
    pub header: Vec<String>,
}

impl Default for ChangeLogCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("helium_log"),
            prefix: "helium".to_string(),
            refresh_rate_s: 60.0,
            change_tolerance_l: 0.0,
            header: vec![
                "Helium level log".to_string(),
                "time (UTC), fill height (cm), volume (L), percentage (%)".to_string(),
            ],
        }
    }
}

/// Settings given to newly enabled subscribers.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifierCfg {
    pub refresh_rate_s: f64,
    pub alarm_level_l: f64,
    pub poll_interval_s: f64,
    pub alarm_enabled: bool,
}

impl Default for NotifierCfg {
    fn default() -> Self {
        Self {
            refresh_rate_s: 3600.0,
            alarm_level_l: 20.0,
            poll_interval_s: 5.0,
            alarm_enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Instrument name used in logs and replies.
    #[serde(default = "default_name")]
    pub name: String,
    pub driver: DriverCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub changelog: ChangeLogCfg,
    #[serde(default)]
    pub notifier: NotifierCfg,
    #[serde(default)]
    pub logging: Logging,
}

fn default_name() -> String {
    "helium".to_string()
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

/// Check that a calibration table can be interpolated: at least two finite
/// points with strictly increasing levels.
pub fn validate_points(points: &[(f64, f64)]) -> eyre::Result<()> {
    if points.len() < 2 {
        eyre::bail!(
            "calibration requires at least two points, got {}",
            points.len()
        );
    }
    for (i, (level, volume)) in points.iter().enumerate() {
        if !level.is_finite() || !volume.is_finite() {
            eyre::bail!("calibration point {i} is not finite");
        }
    }
    for i in 1..points.len() {
        if points[i].0 <= points[i - 1].0 {
            eyre::bail!(
                "calibration levels must be strictly increasing (point {} -> {})",
                i - 1,
                i
            );
        }
    }
    Ok(())
}

pub fn load_calibration_csv(path: &Path) -> eyre::Result<Vec<(f64, f64)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["level_cm", "volume_l"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'level_cm,volume_l', got: {}",
            actual.join(",")
        );
    }

    let mut points = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => points.push((row.level_cm, row.volume_l)),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_points(&points)?;
    Ok(points)
}

/// A period in seconds must be > 0 and representable as a `Duration`.
fn check_period(name: &str, secs: f64) -> eyre::Result<()> {
    if !(secs.is_finite() && secs > 0.0) {
        eyre::bail!("{name} must be > 0");
    }
    if secs > Duration::MAX.as_secs_f64() {
        eyre::bail!("{name} is too large ({secs} s)");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Driver
        check_period("driver.refresh_rate_s", self.driver.refresh_rate_s)?;
        if self.driver.kind == DriverKind::Fixed {
            match self.driver.level_cm {
                Some(l) if l.is_finite() => {}
                _ => eyre::bail!("driver.level_cm is required for kind = \"fixed\""),
            }
        }
        if !(0.0..=1.0).contains(&self.driver.fault_rate) {
            eyre::bail!("driver.fault_rate must be in [0.0, 1.0]");
        }

        // Calibration: the CSV is validated when loaded
        if self.calibration.csv.is_none() {
            validate_points(&self.calibration.points)?;
        }

        // Change log
        check_period("changelog.refresh_rate_s", self.changelog.refresh_rate_s)?;
        if self.changelog.prefix.is_empty() {
            eyre::bail!("changelog.prefix must not be empty");
        }
        if self.changelog.prefix.contains(['/', '\\']) {
            eyre::bail!("changelog.prefix must not contain path separators");
        }
        if !(self.changelog.change_tolerance_l.is_finite()
            && self.changelog.change_tolerance_l >= 0.0)
        {
            eyre::bail!("changelog.change_tolerance_l must be >= 0");
        }

        // Notifier defaults
        check_period("notifier.refresh_rate_s", self.notifier.refresh_rate_s)?;
        check_period("notifier.poll_interval_s", self.notifier.poll_interval_s)?;
        if !self.notifier.alarm_level_l.is_finite() {
            eyre::bail!("notifier.alarm_level_l must be finite");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }

    /// Calibration points, loading the CSV when one is configured.
    pub fn calibration_points(&self) -> eyre::Result<Vec<(f64, f64)>> {
        match &self.calibration.csv {
            Some(path) => load_calibration_csv(path),
            None => Ok(self.calibration.points.clone()),
        }
    }
}
