use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir, stride: usize) -> PathBuf {
    let profile = dir.path().join("profile.csv");
    fs::write(&profile, "mean,scale\n0.0,1.0\n0.0,1.0\n0.0,1.0\n").unwrap();
    let model = dir.path().join("model.json");
    fs::write(
        &model,
        r#"{"kind":"forest","task":"classification","n_features":3,
            "trees":[{"nodes":[{"feature":2,"threshold":1.0,"left":1,"right":2},
                               {"value":0},{"value":1}]}]}"#,
    )
    .unwrap();
    let log = dir.path().join("imu_log.csv");
    let toml = format!(
        r#"
[devices]
sensor_port = "sim"
actuator_port = "sim"

[window]
capacity = 3
stride = {stride}

[channel]
capacity = 1
overflow = "drop_oldest"

[model]
profile = {profile:?}
artifact = {model:?}

[sample_log]
path = {log:?}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Validate the JSON summary printed by a successful run.
#[rstest]
fn json_run_summary_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, 1);

    let out = Command::cargo_bin("damper_cli")
        .unwrap()
        .current_dir(dir.path())
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--duration-s", "0.3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout
        .lines()
        .find(|l| l.contains("\"frames\""))
        .unwrap_or("")
        .to_string();
    assert!(
        !line.is_empty(),
        "no JSON line with frames found; stdout was: {stdout}"
    );

    let v: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");
    assert!(v.get("timestamp").and_then(|x| x.as_i64()).is_some());
    assert_eq!(v.get("model").and_then(|x| x.as_str()), Some("forest"));
    for key in [
        "duration_ms",
        "frames",
        "discarded",
        "empty_reads",
        "inferences",
        "dropped",
        "evicted",
        "transmissions",
        "consumed",
    ] {
        assert!(
            v.get(key).and_then(|x| x.as_u64()).is_some(),
            "{key} should be an unsigned integer"
        );
    }
    assert!(v.get("sample_rate_hz").and_then(|x| x.as_f64()).is_some());

    let frames = v["frames"].as_u64().unwrap();
    assert!(frames > 3, "expected the window to fill, got {frames} frames");
    assert!(v["inferences"].as_u64().unwrap() > 0);
    // Drop-newest never applies to a drop-oldest channel.
    assert_eq!(v["dropped"].as_u64(), Some(0));
}

/// Errors under --json are a single JSON object on stderr.
#[rstest]
fn json_error_object_for_config_failure() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, 0);

    let out = Command::cargo_bin("damper_cli")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&out);
    let line = stderr
        .lines()
        .find(|l| l.contains("\"reason\""))
        .unwrap_or_else(|| panic!("no JSON error on stderr: {stderr}"));
    let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON");
    assert_eq!(v["reason"], "Config");
    assert_eq!(v["exit_code"], 2);
    assert!(
        v["message"]
            .as_str()
            .unwrap()
            .contains("window.stride must be >= 1")
    );
}

#[rstest]
fn json_self_check_reports_dimensions() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, 1);

    let out = Command::cargo_bin("damper_cli")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");
    assert_eq!(v["status"], "ok");
    assert_eq!(v["window"], 3);
    assert_eq!(v["profile_rows"], 3);
    assert_eq!(v["model_features"], 3);
    assert_eq!(v["model"], "forest");
}
