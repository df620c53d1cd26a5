mod cli;
mod error_fmt;
mod logging;
mod messenger;

use clap::Parser;
use cli::{Cli, Commands};
use eyre::{Result, WrapErr};
use helium_config::{Config, DriverKind};
use helium_core::{Calibration, DriverAdapter, Monitor, MonitorCfg, Reading};
use helium_hardware::{SensorKind, make_sensor};
use helium_traits::clock::{Clock, MonotonicClock};
use helium_traits::{LevelSensor, Messenger, SubscriberId};
use messenger::ConsoleMessenger;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn main() {
    // Pretty panic/error reports; ignore if a hook is already installed.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(e) = run(cli) {
        if json {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = helium_config::load_file(&cli.config)?;
    if let Some(csv) = &cli.calibration {
        cfg.calibration.csv = Some(csv.clone());
    }
    let log = logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), file_log = log.has_file(), "configuration loaded");

    let calibration = Calibration::from_points(cfg.calibration_points()?)?;
    let sensor = make_sensor(sensor_kind(&cfg));

    match cli.cmd {
        Commands::Run {
            subscribe,
            run_for_s,
        } => run_monitor(&cfg, sensor, calibration, &subscribe, run_for_s, cli.json),
        Commands::Status => {
            let reading = DriverAdapter::new(sensor, calibration).read_status()?;
            println!("{}", render_reading(&reading, cli.json));
            Ok(())
        }
        Commands::SelfCheck => {
            let points = calibration.points().len();
            let reading = DriverAdapter::new(sensor, calibration).read_status()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "name": cfg.name,
                        "calibration_points": points,
                        "volume_l": reading.volume_l,
                    })
                );
            } else {
                println!("{}: ok ({points} calibration points, {reading})", cfg.name);
            }
            Ok(())
        }
    }
}

fn sensor_kind(cfg: &Config) -> SensorKind {
    match cfg.driver.kind {
        DriverKind::Simulated => SensorKind::Simulated {
            seed: cfg.driver.seed.unwrap_or_else(time_seed),
            fault_rate: cfg.driver.fault_rate,
        },
        // Presence is checked by Config::validate.
        DriverKind::Fixed => SensorKind::Fixed {
            level_cm: cfg.driver.level_cm.unwrap_or_default(),
        },
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

fn render_reading(reading: &Reading, json: bool) -> String {
    if json {
        serde_json::json!({
            "timestamp": reading.timestamp.to_rfc3339(),
            "raw_level_cm": reading.raw_level_cm,
            "volume_l": reading.volume_l,
            "percentage": reading.percentage,
        })
        .to_string()
    } else {
        reading.to_string()
    }
}

fn run_monitor(
    cfg: &Config,
    sensor: Box<dyn LevelSensor + Send>,
    calibration: Calibration,
    subscribe: &[String],
    run_for_s: Option<f64>,
    json: bool,
) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .wrap_err("install Ctrl-C handler")?;
    }

    let clock = MonotonicClock::new();
    let messenger: Arc<dyn Messenger> = Arc::new(ConsoleMessenger::new(json));
    let mut monitor = Monitor::start(sensor, calibration, messenger, MonitorCfg::from(cfg), clock)?;
    for id in subscribe {
        monitor
            .notifiers()
            .set_enabled(&SubscriberId::from(id.as_str()), true)?;
    }

    // An unrepresentable deadline means "until Ctrl-C".
    let deadline = run_for_s
        .and_then(|s| clock.now().checked_add(helium_core::util::duration_from_secs(s)));
    while !shutdown.load(Ordering::SeqCst) && deadline.is_none_or(|d| clock.now() < d) {
        clock.sleep(Duration::from_millis(50));
    }

    monitor.close();
    Ok(())
}
