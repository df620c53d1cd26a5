use std::fs::File;
use std::io::Write;

use helium_config::{load_calibration_csv, load_toml, validate_points};
use proptest::prelude::*;
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn loads_valid_csv() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("cal.csv");
    let mut f = File::create(&p).unwrap();
    writeln!(f, "level_cm,volume_l").unwrap();
    writeln!(f, "0, 12.0").unwrap();
    writeln!(f, "66, 37.5").unwrap();
    writeln!(f, "119, 78").unwrap();
    writeln!(f, "122.3, 79").unwrap();
    drop(f);

    let pts = load_calibration_csv(&p).unwrap();
    assert_eq!(pts, vec![(0.0, 12.0), (66.0, 37.5), (119.0, 78.0), (122.3, 79.0)]);
}

#[rstest]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("cal.csv");
    let mut f = File::create(&p).unwrap();
    writeln!(f, "raw,grams").unwrap();
    writeln!(f, "0,12.0").unwrap();
    writeln!(f, "66,37.5").unwrap();
    drop(f);

    let err = load_calibration_csv(&p).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers"));
}

#[rstest]
fn rejects_single_row() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("cal.csv");
    let mut f = File::create(&p).unwrap();
    writeln!(f, "level_cm,volume_l").unwrap();
    writeln!(f, "0,12.0").unwrap();
    drop(f);

    let err = load_calibration_csv(&p).expect_err("one row");
    assert!(format!("{err}").contains("at least two points"));
}

#[rstest]
fn reports_bad_row_number() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("cal.csv");
    let mut f = File::create(&p).unwrap();
    writeln!(f, "level_cm,volume_l").unwrap();
    writeln!(f, "0,12.0").unwrap();
    writeln!(f, "abc,37.5").unwrap();
    drop(f);

    let err = load_calibration_csv(&p).expect_err("bad row");
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[rstest]
fn config_prefers_csv_over_inline_points() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("cal.csv");
    std::fs::write(&p, "level_cm,volume_l\n0,1\n10,2\n").unwrap();
    let text = format!(
        "[driver]\nkind = \"simulated\"\n[calibration]\ncsv = {:?}\n",
        p.display().to_string()
    );
    let cfg = load_toml(&text).unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.calibration_points().unwrap(), vec![(0.0, 1.0), (10.0, 2.0)]);
}

proptest! {
    #[test]
    fn sorted_distinct_levels_validate(levels in prop::collection::btree_set(0u32..10_000, 2..20)) {
        let pts: Vec<(f64, f64)> = levels
            .into_iter()
            .map(|l| (f64::from(l) / 10.0, f64::from(l)))
            .collect();
        prop_assert!(validate_points(&pts).is_ok());
        let mut rev = pts.clone();
        rev.reverse();
        prop_assert!(validate_points(&rev).is_err());
    }
}
