//! Change-log writer: appends a record to the day's file whenever the reading
//! changes.
//!
//! `ChangeLog` holds the per-cycle logic and is driven directly in tests;
//! `ChangeLogWriter` runs it on its own thread and cadence. There is only
//! one writer per log directory, so file access is never concurrent.
use crate::config::ChangeLogCfg;
use crate::error::{MonitorError, Result};
use crate::poller::ReadingSource;
use crate::reading::Reading;
use crate::util::tick_for;
use crate::worker::Worker;
use chrono::{NaiveDate, Utc};
use helium_traits::clock::Clock;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Leading character of header lines.
pub const HEADER_MARKER: char = '#';

/// `<dir>/<prefix>_<YYYY-MM-DD>.csv`
pub fn log_file_path(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{prefix}_{}.csv", date.format("%Y-%m-%d")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Appended,
    Unchanged,
}

pub struct ChangeLog {
    cfg: ChangeLogCfg,
    /// Last reading successfully appended.
    last: Option<Reading>,
    /// File already reported as lacking a header.
    warned_headerless: Option<PathBuf>,
}

fn persistence(what: &str, path: &Path, e: io::Error) -> MonitorError {
    MonitorError::Persistence(format!("{what} {}: {e}", path.display()))
}

fn first_line(path: &Path) -> io::Result<Option<String>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut line = String::new();
    if BufReader::new(file).read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

impl ChangeLog {
    pub fn new(cfg: ChangeLogCfg) -> Self {
        Self {
            cfg,
            last: None,
            warned_headerless: None,
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        log_file_path(&self.cfg.dir, &self.cfg.prefix, date)
    }

    pub fn last_appended(&self) -> Option<&Reading> {
        self.last.as_ref()
    }

    /// One writer cycle against `today`'s file.
    ///
    /// On error nothing is remembered, so the same reading is retried on the
    /// next cycle.
    pub fn write_cycle(&mut self, reading: &Reading, today: NaiveDate) -> Result<CycleOutcome> {
        let path = self.path_for(today);
        fs::create_dir_all(&self.cfg.dir)
            .map_err(|e| persistence("create log directory", &self.cfg.dir, e))?;
        self.ensure_header(&path)?;

        if let Some(prev) = &self.last
            && prev.volume_unchanged(reading, self.cfg.change_tolerance_l)
        {
            tracing::warn!(%reading, "level unchanged since last record; nothing written");
            return Ok(CycleOutcome::Unchanged);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| persistence("open", &path, e))?;
        writeln!(file, "{}", reading.to_record()).map_err(|e| persistence("append to", &path, e))?;
        tracing::debug!(%reading, file = %path.display(), "record appended");
        self.last = Some(*reading);
        Ok(CycleOutcome::Appended)
    }

    fn ensure_header(&mut self, path: &Path) -> Result<()> {
        match first_line(path).map_err(|e| persistence("read", path, e))? {
            None => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| persistence("create", path, e))?;
                let mut header = String::new();
                for line in &self.cfg.header {
                    header.push_str(&format!("{HEADER_MARKER} {line}\n"));
                }
                file.write_all(header.as_bytes())
                    .map_err(|e| persistence("write header to", path, e))?;
                tracing::info!(file = %path.display(), "new log file");
            }
            Some(line) if line.starts_with(HEADER_MARKER) => {}
            Some(_) => {
                if self.warned_headerless.as_deref() != Some(path) {
                    tracing::warn!(
                        file = %path.display(),
                        "existing log file has no header; appending without one"
                    );
                    self.warned_headerless = Some(path.to_path_buf());
                }
            }
        }
        Ok(())
    }
}

/// Background loop running `ChangeLog` cycles on the configured cadence.
pub struct ChangeLogWriter {
    worker: Worker,
}

impl ChangeLogWriter {
    /// The first cycle runs immediately, then every `cfg.refresh_rate`.
    pub fn start<R, C>(source: R, cfg: ChangeLogCfg, clock: C) -> Result<Self>
    where
        R: ReadingSource + 'static,
        C: Clock + Send + 'static,
    {
        let refresh_rate = cfg.refresh_rate;
        let tick = tick_for(refresh_rate);
        let dir = cfg.dir.clone();
        let mut log = ChangeLog::new(cfg);

        let worker = Worker::spawn("change-log", move |stop| {
            tracing::info!(dir = %dir.display(), refresh_s = refresh_rate.as_secs_f64(), "change log started");
            let mut last_cycle: Option<Instant> = None;
            loop {
                let due = last_cycle.is_none_or(|t| clock.elapsed_since(t) >= refresh_rate);
                if due {
                    last_cycle = Some(clock.now());
                    let reading = source.latest();
                    if let Err(e) = log.write_cycle(&reading, Utc::now().date_naive()) {
                        tracing::error!(error = %e, "change log cycle failed; retrying next cycle");
                    }
                }
                if stop.wait(tick) {
                    break;
                }
            }
            tracing::info!("change log stopped");
        })
        .map_err(|e| MonitorError::Spawn {
            name: "change-log".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { worker })
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Stop the loop and wait for it to exit. Idempotent.
    pub fn stop(&mut self) -> bool {
        self.worker.stop()
    }
}
