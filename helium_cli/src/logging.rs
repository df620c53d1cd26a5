//! Logging context for one CLI process.
//!
//! Console output goes to stderr (stdout carries readings and messages). An
//! optional JSON-lines file sink is written through a non-blocking appender;
//! the returned `LogGuard` flushes it when dropped.

use eyre::{Result, WrapErr, eyre};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer alive; hold it until the process is done logging.
#[must_use = "dropping the guard stops the log file writer"]
pub struct LogGuard {
    file: Option<WorkerGuard>,
}

impl LogGuard {
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }
}

fn rotation(name: Option<&str>) -> Rotation {
    match name {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

fn file_layer(path: &Path, cfg: &helium_config::Logging) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre!("logging.file has no file name: {}", path.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(rotation(cfg.rotation.as_deref()))
        .filename_prefix(name.to_string_lossy().into_owned())
        .build(dir)
        .wrap_err_with(|| format!("open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let level = cfg.level.as_deref().unwrap_or("info");
    let filter =
        EnvFilter::try_new(level).wrap_err_with(|| format!("invalid logging.level {level:?}"))?;
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();
    Ok((layer, guard))
}

/// Install the global subscriber. `RUST_LOG` overrides `console_level`.
pub fn init(console_level: &str, json: bool, cfg: &helium_config::Logging) -> Result<LogGuard> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(console_level)
            .wrap_err_with(|| format!("invalid --log-level {console_level:?}"))?,
    };
    let console: BoxedLayer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers = vec![console];
    let mut file_guard = None;
    if let Some(file) = &cfg.file {
        let (layer, guard) = file_layer(Path::new(file), cfg)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(LogGuard { file: file_guard })
}
