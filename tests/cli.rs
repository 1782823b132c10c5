use assert_cmd::Command;
use predicates::prelude::*;
use eventlabel::io_json::write_json;
use eventlabel::{VideoEvent, VideoEventContainer};
use uuid::Uuid;

const EVENTS: &str = "tests/fixtures/sample_events.json";
const INVALID_EVENTS: &str = "tests/fixtures/sample_invalid_events.json";
const SCHEMA: &str = "tests/fixtures/sample_schema.json";

fn eventlabel() -> Command {
    let mut cmd = Command::cargo_bin("eventlabel").unwrap();
    cmd.env_remove("EVENTLABEL_SCHEMA");
    cmd
}

#[test]
fn runs() {
    eventlabel()
        .assert()
        .success()
        .stdout(predicates::str::contains("eventlabel"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = eventlabel();
    cmd.arg("-V");
    cmd.assert().success().stdout("eventlabel 0.1.0\n");
}

// Validate subcommand tests

#[test]
fn validate_valid_events_succeeds() {
    let mut cmd = eventlabel();
    cmd.args(["validate", EVENTS, "--schema", SCHEMA]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Validation passed"));
}

#[test]
fn validate_reads_schema_from_env() {
    let mut cmd = eventlabel();
    cmd.env("EVENTLABEL_SCHEMA", SCHEMA);
    cmd.args(["validate", EVENTS]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Validation passed"));
}

#[test]
fn validate_requires_schema() {
    let mut cmd = eventlabel();
    cmd.args(["validate", EVENTS]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("--schema"));
}

#[test]
fn validate_invalid_events_fails() {
    let mut cmd = eventlabel();
    cmd.args(["validate", INVALID_EVENTS, "--schema", SCHEMA]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("3 error(s) and 1 warning(s)"))
        .stdout(predicates::str::contains("UnknownEventLabel"))
        .stdout(predicates::str::contains("EventAttributeViolation"))
        .stdout(predicates::str::contains("InvalidBBoxOrdering"))
        .stdout(predicates::str::contains("DanglingChildObject"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = eventlabel();
    cmd.args(["validate", EVENTS, "--schema", SCHEMA, "--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"error_count\": 0"))
        .stdout(predicates::str::contains("\"warning_count\": 0"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");

    let mut event = VideoEvent::build_simple(20, 21, "turn", None, None, None);
    event
        .add_child_event(&VideoEvent::new().with_uuid(Uuid::new_v4()))
        .unwrap();
    let events: VideoEventContainer = vec![event].into();
    write_json(&path, &events).unwrap();

    let mut cmd = eventlabel();
    cmd.arg("validate").arg(&path).args(["--schema", SCHEMA]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("DanglingChildEvent"));

    let mut cmd = eventlabel();
    cmd.arg("validate")
        .arg(&path)
        .args(["--schema", SCHEMA, "--strict"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Validation failed"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = eventlabel();
    cmd.args(["validate", "nonexistent_file.json", "--schema", SCHEMA]);
    cmd.assert().failure();
}

#[test]
fn validate_unknown_event_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(&path, r#"{"events": [{"type": "acme.Mystery"}]}"#).unwrap();

    let mut cmd = eventlabel();
    cmd.arg("validate").arg(&path).args(["--schema", SCHEMA]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("acme.Mystery"));
}

// Schema subcommand tests

#[test]
fn schema_prints_active_schema() {
    let mut cmd = eventlabel();
    cmd.args(["schema", EVENTS]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"crossing\""))
        .stdout(predicates::str::contains("\"direction\""))
        .stdout(predicates::str::contains("\"person\""));
}

#[test]
fn schema_output_validates_its_events() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = dir.path().join("schema.json");

    let output = eventlabel().args(["schema", EVENTS]).output().unwrap();
    assert!(output.status.success());
    std::fs::write(&schema_path, &output.stdout).unwrap();

    let mut cmd = eventlabel();
    cmd.args(["validate", EVENTS, "--schema"]).arg(&schema_path);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Validation passed"));
}

// Render subcommand tests

#[test]
fn render_single_frame() {
    let mut cmd = eventlabel();
    cmd.args(["render", EVENTS, "--frame", "11"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"crossing\""))
        .stdout(predicates::str::contains("\"weather\""))
        .stdout(predicates::str::contains("\"person\""))
        .stdout(predicates::str::contains("\"turn\"").not());
}

#[test]
fn render_uncovered_frame_is_empty() {
    let mut cmd = eventlabel();
    cmd.args(["render", EVENTS, "--frame", "5"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"events\": []"));
}

#[test]
fn render_all_frames() {
    let output = eventlabel().args(["render", EVENTS]).output().unwrap();
    assert!(output.status.success());

    let frames: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keys: Vec<&str> = frames
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["10", "11", "12", "20", "21", "22"]);
    assert_eq!(frames["21"]["events"][0]["label"], "turn");
}
