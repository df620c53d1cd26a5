#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<(f64, f64)>, Vec<f64>)| {
    let (points, levels) = input;
    let Ok(cal) = helium_core::Calibration::from_points(points) else {
        return;
    };
    let (min_cm, _) = cal.points()[0];
    let (max_cm, _) = cal.points()[cal.points().len() - 1];
    for level in levels {
        match cal.volume_at(level) {
            Ok(v) => {
                assert!((min_cm..=max_cm).contains(&level));
                let _ = cal.percentage_of(v);
            }
            Err(_) => assert!(!(min_cm..=max_cm).contains(&level)),
        }
    }
});
