use std::fs;

use damper_core::error::DamperError;
use damper_core::{Sample, SampleLogger};
use tempfile::tempdir;

fn sample(t: f64, z: f64) -> Sample {
    Sample {
        elapsed_s: t,
        x: 0.01,
        y: -0.02,
        z,
    }
}

#[test]
fn create_append_close_then_reread() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("imu_log.csv");

    let mut log = SampleLogger::create(&path, 2).unwrap();
    log.append(&sample(0.0, 0.998)).unwrap();
    log.append(&sample(0.01, 1.002)).unwrap();
    // Flushed on the second record.
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "elapsed_sec,raw_x,raw_y,raw_z\n0.000,0.01,-0.02,0.998\n0.010,0.01,-0.02,1.002\n"
    );

    log.append(&sample(0.02, 0.5)).unwrap();
    assert_eq!(log.records(), 3);
    drop(log.close().unwrap());

    let text = fs::read_to_string(&path).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], "0.020,0.01,-0.02,0.5");
}

#[test]
fn create_truncates_an_existing_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("imu_log.csv");
    fs::write(&path, "stale\nrows\n").unwrap();

    drop(SampleLogger::create(&path, 20).unwrap().close().unwrap());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "elapsed_sec,raw_x,raw_y,raw_z\n"
    );
}

#[test]
fn create_in_missing_directory_is_a_log_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("imu_log.csv");
    let err = SampleLogger::create(&path, 20).unwrap_err();
    assert!(matches!(err, DamperError::Log(ref m) if m.starts_with("create ")), "{err:?}");
}
