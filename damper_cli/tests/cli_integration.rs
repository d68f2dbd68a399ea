use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const W: usize = 4;

fn write_profile(dir: &Path, rows: usize) -> PathBuf {
    let path = dir.join("profile.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "mean,scale").unwrap();
    for _ in 0..rows {
        writeln!(f, "1.0,0.05").unwrap();
    }
    path
}

fn write_model(dir: &Path, width: usize) -> PathBuf {
    let path = dir.join("model.json");
    let weights = vec!["0.1"; width].join(",");
    fs::write(
        &path,
        format!(r#"{{"kind":"linear","weights":[{weights}],"bias":0.0}}"#),
    )
    .unwrap();
    path
}

// Sim devices, a small window and artifacts sized to match it.
fn write_config(dir: &tempfile::TempDir, sensor_port: &str, profile_rows: usize) -> PathBuf {
    let profile = write_profile(dir.path(), profile_rows);
    let model = write_model(dir.path(), W);
    let log = dir.path().join("imu_log.csv");
    let toml = format!(
        r#"
[devices]
sensor_port = "{sensor_port}"
actuator_port = "sim"

[timing]
sample_period_ms = 10
actuation_period_ms = 20
idle_us = 1000

[window]
capacity = {W}
stride = 2

[channel]
capacity = 5
overflow = "drop_newest"

[model]
profile = {profile:?}
artifact = {model:?}

[sample_log]
path = {log:?}
flush_every = 5
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["health"], 0, "ok", "stdout")]
#[case(&["self-check"], 0, "Self-check OK", "stdout")]
#[case(&["run", "--duration-s", "0.3"], 0, "Run complete", "stdout")]
#[case(&["run", "--duration-s", "0"], 2, "--duration-s must be a positive", "stderr")]
#[case(&[], 2, "Usage", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "sim", W);

    let mut cmd = Command::cargo_bin("damper_cli").unwrap();
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("--log-level")
        .arg("error")
        .args(args);

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

#[rstest]
fn run_writes_the_sample_log() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "sim", W);

    Command::cargo_bin("damper_cli")
        .unwrap()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .arg("--log-level")
        .arg("error")
        .args(["run", "--duration-s", "0.3", "--stats"])
        .assert()
        .success()
        .stderr(predicate::str::contains("--- Damper Stats ---"));

    let log = fs::read_to_string(dir.path().join("imu_log.csv")).unwrap();
    let mut lines = log.lines();
    assert_eq!(lines.next(), Some("elapsed_sec,raw_x,raw_y,raw_z"));
    let rows: Vec<&str> = lines.collect();
    assert!(!rows.is_empty(), "no samples logged");
    for row in rows {
        assert_eq!(row.split(',').count(), 4, "bad row: {row}");
    }
}

#[rstest]
fn cli_reports_bad_profile_header() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "sim", W);

    let bad_csv = dir.path().join("profile.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "mu,sigma").unwrap();
    writeln!(f, "1.0,0.05").unwrap();

    Command::cargo_bin("damper_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn profile_shorter_than_window_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "sim", W - 1);

    Command::cargo_bin("damper_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "normalization profile has 3 positions but the window holds 4",
        ));
}

#[rstest]
fn invalid_config_exits_with_two() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "sim", W);
    let text = fs::read_to_string(&cfg)
        .unwrap()
        .replace("stride = 2", "stride = 0");
    fs::write(&cfg, text).unwrap();

    Command::cargo_bin("damper_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("health")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("window.stride must be >= 1"));
}

#[rstest]
fn missing_config_file_is_reported() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("damper_cli")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("health")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("What happened: Invalid configuration"));
}

#[rstest]
fn unknown_serial_port_fails_before_the_loop() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "/dev/damper-missing-port", W);

    Command::cargo_bin("damper_cli")
        .unwrap()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--duration-s", "0.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("damper-missing-port"));
}
