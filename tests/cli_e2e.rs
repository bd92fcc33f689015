#![cfg(unix)]

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn write_tool(dir: &Path, stdout: &str, exit_code: i32) -> String {
    let path = dir.join("tool.sh");
    fs::write(&path, format!("printf '%s' '{stdout}'\nexit {exit_code}\n"))
        .expect("write tool script");
    path.display().to_string()
}

fn run_check(tool: &str, stdin: &str, extra: &[&str]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_driftcheck"))
        .args(["check", "-k", "GET /api/v2/users/:id", "--runner", "sh", "--tool", tool])
        .args(extra)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("driftcheck binary should run");
    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(stdin.as_bytes())
        .expect("write payload");
    child.wait_with_output().expect("wait for driftcheck")
}

fn single_record(stdout: &[u8]) -> Value {
    let text = String::from_utf8(stdout.to_vec()).expect("stdout utf8");
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1, "expected one record, got: {text}");
    serde_json::from_str(lines[0]).expect("valid json record")
}

#[test]
fn clean_check_emits_record_and_exits_zero() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(
        dir.path(),
        r#"{"hasBreakingChanges": false, "summary": {"breaking": 0, "warning": 2}, "compatibilityScore": 97}"#,
        0,
    );

    let output = run_check(&tool, r#"{"id": 1}"#, &[]);
    assert_eq!(output.status.code(), Some(0));

    let record = single_record(&output.stdout);
    assert_eq!(record["version"], "driftcheck.v0");
    assert_eq!(record["key"], "GET /api/v2/users/:id");
    assert_eq!(record["outcome"], "CLEAN");
    assert_eq!(record["exit_code"], 0);
    assert_eq!(record["has_drift"], false);
    assert_eq!(record["has_breaking"], false);
    assert_eq!(record["breaking_count"], 0);
    assert_eq!(record["warning_count"], 2);
    assert_eq!(record["compatibility_score"], 97.0);
    assert_eq!(record["violations"], serde_json::json!([]));
    assert_eq!(record["tool_versions"]["driftcheck"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn breaking_check_exits_one_with_violations() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(
        dir.path(),
        r#"{"hasBreakingChanges": true, "summary": {"breaking": 3, "warning": 1}, "compatibilityScore": 40}"#,
        1,
    );

    let output = run_check(&tool, r#"{"id": 1}"#, &[]);
    assert_eq!(output.status.code(), Some(1));

    let record = single_record(&output.stdout);
    assert_eq!(record["outcome"], "DRIFT");
    assert_eq!(record["has_drift"], true);
    assert_eq!(record["breaking_count"], 3);
    let violations = record["violations"].as_array().expect("violations");
    assert!(violations.iter().any(|violation| {
        violation == "GET /api/v2/users/:id has 3 breaking changes! Compatibility: 40%"
    }));
}

#[test]
fn empty_report_uses_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "", 1);

    let output = run_check(&tool, r#"{"id": 1}"#, &[]);
    assert_eq!(output.status.code(), Some(1));

    let record = single_record(&output.stdout);
    assert_eq!(record["has_breaking"], false);
    assert_eq!(record["breaking_count"], 0);
    assert_eq!(record["warning_count"], 0);
    assert_eq!(record["compatibility_score"], 100.0);
    assert_eq!(record["report"], serde_json::json!({}));
}

#[test]
fn missing_tool_is_refused_not_reported_as_drift() {
    let output = run_check(
        "/nonexistent/driftcheck-tool",
        r#"{"id": 1}"#,
        &["--direct"],
    );
    assert_eq!(output.status.code(), Some(2));

    let envelope = single_record(&output.stdout);
    assert_eq!(envelope["outcome"], "REFUSAL");
    assert_eq!(envelope["refusal"]["code"], "E_TOOL");
}

#[test]
fn garbage_report_is_refused() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "not a report", 0);

    let output = run_check(&tool, r#"{"id": 1}"#, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(
        single_record(&output.stdout)["refusal"]["code"],
        "E_BAD_REPORT"
    );
}

#[test]
fn invalid_stdin_payload_is_refused() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "", 0);

    let output = run_check(&tool, "<html>", &[]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(
        single_record(&output.stdout)["refusal"]["code"],
        "E_BAD_INPUT"
    );
}

#[test]
fn json_logs_go_to_stderr_only() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "", 0);

    let mut child = Command::new(env!("CARGO_BIN_EXE_driftcheck"))
        .args(["check", "-k", "GET /x", "--runner", "sh", "--tool", tool.as_str()])
        .env("DRIFTCHECK_LOG", "debug")
        .env("DRIFTCHECK_LOG_JSON", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("driftcheck binary should run");
    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(b"{}")
        .expect("write payload");
    let output = child.wait_with_output().expect("wait");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(single_record(&output.stdout)["outcome"], "CLEAN");

    let stderr = String::from_utf8(output.stderr).expect("stderr utf8");
    let events: Vec<Value> = stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("json log line"))
        .collect();
    assert!(
        events
            .iter()
            .any(|event| event["fields"]["message"] == "drift check finished")
    );
}
