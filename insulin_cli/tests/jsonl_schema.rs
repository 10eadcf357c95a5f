use assert_cmd::prelude::*;
use rstest::rstest;
use std::process::Command;
use tempfile::{TempDir, tempdir};

fn insulin_json(dir: &TempDir) -> Command {
    let state = dir.path().join("state.json");
    if !state.exists() {
        std::fs::write(&state, r#"{"acceptedTerms":"true"}"#).unwrap();
    }
    let mut cmd = Command::cargo_bin("insulin").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--state")
        .arg(dir.path().join("state.json"));
    cmd
}

fn single_json_line(out: &[u8]) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(out);
    let line = stdout.lines().find(|l| l.starts_with('{') || l.starts_with('[')).unwrap_or("");
    assert!(!line.is_empty(), "no JSON line found; stdout was: {stdout}");
    serde_json::from_str(line).expect("valid JSON")
}

fn is_number_or_null(v: Option<&serde_json::Value>) -> bool {
    match v {
        Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some(),
        _ => false,
    }
}

/// Validate the JSON schema for a dose result.
#[rstest]
fn calc_success_schema() {
    let dir = tempdir().unwrap();
    let out = insulin_json(&dir)
        .args([
            "calc",
            "--carbs",
            "45",
            "--glucose",
            "180",
            "--carb-ratio",
            "10",
            "--correction-factor",
            "50",
            "--target",
            "120",
            "--trend-value",
            "-25",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);

    for key in ["carb_dose", "correction_dose", "raw_total", "rounded_total", "dose_units"] {
        assert!(v.get(key).and_then(|x| x.as_f64()).is_some(), "{key} should be a number");
    }
    assert_eq!(v["outcome"], "dose");
    assert_eq!(v["dose_text"], "5.0");
    assert_eq!(v["safety"], "none");
    assert!(v["carb_deficit_g"].is_null());
    assert!(v["safety_message"].is_null());
    assert_eq!(v["units"], "mg/dL");
    assert_eq!(v["effective_glucose_mgdl"], 155.0);
    assert!(v["profile"]["id"].as_str().is_some());
    assert!(is_number_or_null(v["inputs"].get("trend_adjustment_mgdl")));
}

/// A negative total reports the carb deficit and a zero dose.
#[rstest]
fn calc_deficit_schema() {
    let dir = tempdir().unwrap();
    let out = insulin_json(&dir)
        .args([
            "calc",
            "--carbs",
            "5",
            "--glucose",
            "90",
            "--carb-ratio",
            "10",
            "--correction-factor",
            "50",
            "--target",
            "150",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    assert_eq!(v["outcome"], "carb-deficit");
    assert_eq!(v["carb_deficit_g"], 7.0);
    assert_eq!(v["dose_units"], 0.0);
    assert_eq!(v["rounded_total"], -1.0);
}

/// Validation failures are structured on stdout with exit code 3.
#[rstest]
fn validation_error_schema() {
    let dir = tempdir().unwrap();
    let out = insulin_json(&dir)
        .args(["calc", "--carbs", "-5", "--glucose", "100"])
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    assert_eq!(v["reason"], "Validation");
    let fields = v["fields"].as_array().expect("fields array");
    assert!(fields.iter().any(|f| f["field"] == "carbsToEat" && f["reason"] == "negative"));
    assert!(fields.iter().any(|f| f["field"] == "carbRatio" && f["reason"] == "missing"));
    assert!(v["message"].as_str().is_some_and(|m| m.starts_with("What happened")));
}

#[rstest]
fn state_error_schema() {
    let dir = tempdir().unwrap();
    let out = insulin_json(&dir)
        .args(["profiles", "switch", "ghost"])
        .assert()
        .code(4)
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    assert_eq!(v["reason"], "UnknownProfile");
}

#[rstest]
fn terms_not_accepted_schema() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("insulin").unwrap();
    let out = cmd
        .args(["--json", "--log-level", "error", "--state"])
        .arg(dir.path().join("fresh.json"))
        .args(["calc", "--carbs", "10", "--glucose", "100"])
        .assert()
        .code(4)
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    assert_eq!(v["reason"], "TermsNotAccepted");
}

#[rstest]
fn profiles_list_schema() {
    let dir = tempdir().unwrap();
    let out = insulin_json(&dir)
        .args(["--at", "21:00", "profiles", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    let list = v.as_array().expect("array of profiles");
    assert_eq!(list.len(), 2);
    let night = list.iter().find(|p| p["name"] == "Night").unwrap();
    assert_eq!(night["active"], true);
    assert_eq!(night["start"], "20:00");
    assert_eq!(night["end"], "06:00");
    assert!(night["carb_ratio"].is_null());
}

#[rstest]
fn timeline_schema() {
    let dir = tempdir().unwrap();
    let out = insulin_json(&dir)
        .arg("timeline")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = single_json_line(&out);
    let segs = v["segments"].as_array().unwrap();
    assert_eq!(segs.len(), 3);
    assert!(segs.iter().any(|s| s["name"] == "Night" && s["to"] == "24:00"));
}
