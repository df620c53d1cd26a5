use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

// Fixed driver at 66 cm (37.5 L on the default table); change log in the tempdir.
fn write_config(dir: &TempDir, driver: &str) -> PathBuf {
    let log_dir = dir.path().join("log");
    let toml = format!(
        r#"
name = "test dewar"

[driver]
{driver}
refresh_rate_s = 0.05

[changelog]
path = "{}"
prefix = "test_helium"
refresh_rate_s = 0.05

[notifier]
refresh_rate_s = 3600
poll_interval_s = 0.01
"#,
        log_dir.display()
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn fixed_config(dir: &TempDir) -> PathBuf {
    write_config(dir, "kind = \"fixed\"\nlevel_cm = 66.0")
}

fn helium(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("helium").unwrap();
    cmd.arg("--log-level").arg("error").arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["status"], 0, "37.50 L", "stdout")]
#[case(&["self-check"], 0, "test dewar: ok (4 calibration points", "stdout")]
#[case(&["run", "--run-for-s", "abc"], 2, "invalid value", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);

    let mut cmd = helium(&cfg);
    for a in args {
        cmd.arg(a);
    }
    let assert = cmd.assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn status_json_has_reading_fields() {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);
    let out = helium(&cfg)
        .arg("--json")
        .arg("status")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout.lines().next().unwrap_or_default();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["raw_level_cm"], 66.0);
    assert_eq!(v["volume_l"], 37.5);
    assert!(v["timestamp"].is_string());
    assert!(v["percentage"].is_number());
}

#[test]
fn out_of_range_level_fails_with_sensor_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "kind = \"fixed\"\nlevel_cm = 500.0");
    helium(&cfg)
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("outside the calibrated range"));
}

#[test]
fn out_of_range_json_error() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "kind = \"fixed\"\nlevel_cm = 500.0");
    let out = helium(&cfg)
        .arg("--json")
        .arg("status")
        .assert()
        .code(3)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&out);
    let line = stderr
        .lines()
        .find(|l| l.contains("\"reason\""))
        .unwrap_or_default();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "OutOfRange");
    assert_eq!(v["details"]["level_cm"], 500.0);
}

#[test]
fn missing_config_is_reported() {
    let dir = tempdir().unwrap();
    helium(&dir.path().join("nope.toml"))
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config file could not be read"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "kind = \"fixed\"");
    helium(&cfg)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("driver.level_cm is required"));
}

#[test]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);

    let bad_csv = dir.path().join("calib.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "level,volume").unwrap();
    writeln!(f, "0,12").unwrap();
    writeln!(f, "122.3,79").unwrap();

    helium(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[test]
fn calibration_csv_replaces_table() {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);
    let csv = dir.path().join("calib.csv");
    fs::write(&csv, "level_cm,volume_l\n0,0\n100,50\n").unwrap();

    helium(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("33.00 L"));
}

#[test]
fn run_notifies_subscribers_and_writes_log() {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);

    helium(&cfg)
        .args(["run", "--subscribe", "42", "--run-for-s", "0.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[42]").and(predicate::str::contains("37.50 L")));

    let files: Vec<_> = fs::read_dir(dir.path().join("log"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("test_helium_") && name.ends_with(".csv"), "{name}");
    let text = fs::read_to_string(files[0].path()).unwrap();
    let records: Vec<_> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(records.len(), 1, "fixed level is logged once: {text}");
}

#[test]
fn run_json_messages() {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);
    let out = helium(&cfg)
        .args(["--json", "run", "--subscribe", "-771946321", "--run-for-s", "0.3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let v: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(v["recipient"], "-771946321");
    assert_eq!(v["audible"], false);
}

#[test]
fn file_logging_writes_json_lines() {
    let dir = tempdir().unwrap();
    let cfg = fixed_config(&dir);
    let log_file = dir.path().join("helium.log");
    let mut text = fs::read_to_string(&cfg).unwrap();
    text.push_str(&format!(
        "\n[logging]\nfile = \"{}\"\nlevel = \"info\"\n",
        log_file.display()
    ));
    fs::write(&cfg, text).unwrap();

    helium(&cfg)
        .args(["run", "--run-for-s", "0.1"])
        .assert()
        .success();
    let logged = fs::read_to_string(&log_file).unwrap();
    assert!(logged.contains("monitor started"), "{logged}");
    for line in logged.lines() {
        serde_json::from_str::<serde_json::Value>(line).unwrap();
    }
}
