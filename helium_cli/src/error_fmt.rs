//! Human-readable error descriptions and structured JSON error formatting.

use helium_core::MonitorError;

/// Full context chain of a report, outermost first.
fn chain_text(err: &eyre::Report) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Read(msg) => format!(
                "What happened: The level sensor could not be read ({msg}).\nLikely causes: Meter not connected, wrong driver settings, or a transient fault.\nHow to fix: Check the [driver] section and the meter connection, then retry."
            ),
            MonitorError::OutOfRange {
                level_cm,
                min_cm,
                max_cm,
            } => format!(
                "What happened: The meter reported {level_cm} cm, outside the calibrated range {min_cm}..{max_cm} cm.\nLikely causes: Broken probe, or a calibration table that does not cover this dewar.\nHow to fix: Check the probe, or extend [calibration] points / the calibration CSV."
            ),
            MonitorError::Persistence(msg) => format!(
                "What happened: The change log could not be written ({msg}).\nLikely causes: Missing permissions or a full disk.\nHow to fix: Check changelog.path in the config."
            ),
            MonitorError::UnknownSubscriber(id) => format!(
                "What happened: Subscriber {id} has no active notifications.\nHow to fix: Enable notifications for {id} first."
            ),
            MonitorError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            MonitorError::Spawn { name, reason } => format!(
                "What happened: Could not start the {name} thread ({reason}).\nLikely causes: Process or memory limits.\nHow to fix: Check ulimits and free resources."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = chain_text(err);
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'level_cm,volume_l'.".to_string();
    }

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE>. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    format!(
        "Something went wrong: {msg}\nHow to fix: Re-run with --log-level=debug for details."
    )
}

/// Stable exit codes: 3 sensor, 4 persistence, 5 threads, 1 everything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::Read(_) | MonitorError::OutOfRange { .. }) => 3,
        Some(MonitorError::Persistence(_)) => 4,
        Some(MonitorError::Spawn { .. }) => 5,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::Read(_)) => "Read",
        Some(MonitorError::OutOfRange { .. }) => "OutOfRange",
        Some(MonitorError::Persistence(_)) => "Persistence",
        Some(MonitorError::UnknownSubscriber(_)) => "UnknownSubscriber",
        Some(MonitorError::Config(_)) => "Config",
        Some(MonitorError::Spawn { .. }) => "Spawn",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let message = humanize(err);
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::OutOfRange {
            level_cm,
            min_cm,
            max_cm,
        }) => json!({
            "reason": reason,
            "details": { "level_cm": level_cm, "min_cm": min_cm, "max_cm": max_cm },
            "message": message,
        })
        .to_string(),
        _ => json!({ "reason": reason, "message": message }).to_string(),
    }
}
