use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("ocrnav.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn last_json_line(bytes: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(bytes);
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .expect("a JSON line");
    serde_json::from_str(line).expect("valid JSON")
}

/// Validate the result line for a successful navigate run.
#[rstest]
fn navigate_success_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[ocr]\nregion = [0, 0, 200, 24]\n");

    let out = Command::cargo_bin("ocrnav")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .args(["navigate", "--x", "4", "--y", "5", "--z", "-2", "--max-ticks", "5000"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let v = last_json_line(&out.stdout);
    assert!(v["timestamp"].as_u64().is_some());
    assert_eq!(v["target"]["x"], 4.0);
    assert_eq!(v["target"]["z"], -2.0);
    let fin = &v["final"];
    assert!((fin["x"].as_f64().unwrap() - 4.0).abs() <= 0.7);
    assert!((fin["z"].as_f64().unwrap() + 2.0).abs() <= 0.7);
    assert_eq!(v["mapping"]["forward"], "z-");
    assert_eq!(v["mapping"]["strafe"], "x+");
    assert_eq!(v["mapping"]["ascend"], "y+");
    assert!(v["duration_ms"].as_u64().is_some());
    assert!(v["abort_reason"].is_null());
}

#[rstest]
#[case("", &["navigate", "--x", "1"], 3, "MissingRegion")]
#[case(
    "[ocr]\nregion = [0, 0, 200, 24]\n[calibration]\nmax_attempts = 1\n",
    &["--sim-speed", "0", "navigate", "--x", "1"],
    5,
    "CalibrationExhausted"
)]
fn navigate_failure_reports_reason(
    #[case] toml: &str,
    #[case] args: &[&str],
    #[case] code: i32,
    #[case] reason: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, toml);

    let out = Command::cargo_bin("ocrnav")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(args)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(code));

    let result = last_json_line(&out.stdout);
    assert_eq!(result["abort_reason"], reason);
    assert!(result["final"].is_null());

    let err = last_json_line(&out.stderr);
    assert_eq!(err["reason"], reason);
    assert!(err["message"].as_str().unwrap().contains("What happened"));
}

#[test]
fn read_prints_coordinates_as_json() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[ocr]\nregion = [0, 0, 200, 24]\n");

    let out = Command::cargo_bin("ocrnav")
        .unwrap()
        .args(["--json", "--sim-start=7,1.25,-8"])
        .arg("--config")
        .arg(&cfg)
        .arg("read")
        .output()
        .unwrap();
    assert!(out.status.success());

    let v = last_json_line(&out.stdout);
    assert_eq!(v["x"], 7.0);
    assert_eq!(v["y"], 1.25);
    assert_eq!(v["z"], -8.0);
}
