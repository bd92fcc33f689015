use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DriftError, Result};

pub const DEFAULT_COMPATIBILITY_SCORE: f64 = 100.0;

/// Normalized snapshot of one drift tool run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub exit_code: i32,
    pub has_drift: bool,
    pub has_breaking: bool,
    pub breaking_count: u64,
    pub warning_count: u64,
    pub compatibility_score: f64,
    pub report: Map<String, Value>,
}

impl DriftResult {
    /// Build a result from the tool's exit code and raw stdout.
    ///
    /// Blank stdout yields an empty report; anything else must be a JSON
    /// object or the call fails with [`DriftError::MalformedReport`].
    pub fn from_output(exit_code: i32, stdout: &str) -> Result<Self> {
        let report = parse_report(stdout)?;
        Ok(Self::from_report(exit_code, report))
    }

    pub fn from_report(exit_code: i32, report: Map<String, Value>) -> Self {
        let summary = report.get("summary");
        let has_breaking = report
            .get("hasBreakingChanges")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let breaking_count = summary_count(summary, "breaking");
        let warning_count = summary_count(summary, "warning");
        let compatibility_score = report
            .get("compatibilityScore")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_COMPATIBILITY_SCORE);

        Self {
            exit_code,
            has_drift: drift_detected(exit_code),
            has_breaking,
            breaking_count,
            warning_count,
            compatibility_score,
            report,
        }
    }
}

/// The tool signals drift at or above its fail-on threshold through a
/// non-zero exit status.
pub fn drift_detected(exit_code: i32) -> bool {
    exit_code != 0
}

pub fn parse_report(stdout: &str) -> Result<Map<String, Value>> {
    if stdout.trim().is_empty() {
        return Ok(Map::new());
    }

    serde_json::from_str::<Map<String, Value>>(stdout).map_err(|source| {
        DriftError::MalformedReport {
            source,
            stdout: stdout.to_owned(),
        }
    })
}

fn summary_count(summary: Option<&Value>, field: &str) -> u64 {
    let Some(value) = summary.and_then(|summary| summary.get(field)) else {
        return 0;
    };
    value.as_u64().unwrap_or_else(|| {
        tracing::debug!(field, %value, "summary count is not an unsigned integer; using 0");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_run_with_warnings() {
        let stdout = r#"{"hasBreakingChanges": false, "summary": {"breaking": 0, "warning": 2}, "compatibilityScore": 97}"#;
        let result = DriftResult::from_output(0, stdout).expect("valid report");

        assert_eq!(result.exit_code, 0);
        assert!(!result.has_drift);
        assert!(!result.has_breaking);
        assert_eq!(result.breaking_count, 0);
        assert_eq!(result.warning_count, 2);
        assert_eq!(result.compatibility_score, 97.0);
    }

    #[test]
    fn breaking_run() {
        let stdout = r#"{"hasBreakingChanges": true, "summary": {"breaking": 3, "warning": 1}, "compatibilityScore": 40}"#;
        let result = DriftResult::from_output(1, stdout).expect("valid report");

        assert!(result.has_drift);
        assert!(result.has_breaking);
        assert_eq!(result.breaking_count, 3);
        assert_eq!(result.warning_count, 1);
        assert_eq!(result.compatibility_score, 40.0);
    }

    #[test]
    fn blank_stdout_takes_defaults() {
        for stdout in ["", "   ", "\n\t\n"] {
            let result = DriftResult::from_output(1, stdout).expect("blank is not malformed");
            assert!(result.has_drift);
            assert!(!result.has_breaking);
            assert_eq!(result.breaking_count, 0);
            assert_eq!(result.warning_count, 0);
            assert_eq!(result.compatibility_score, DEFAULT_COMPATIBILITY_SCORE);
            assert!(result.report.is_empty());
        }
    }

    #[test]
    fn missing_keys_take_defaults_individually() {
        let report = json!({ "summary": { "warning": 5 } });
        let Value::Object(report) = report else {
            unreachable!()
        };
        let result = DriftResult::from_report(0, report);

        assert!(!result.has_breaking);
        assert_eq!(result.breaking_count, 0);
        assert_eq!(result.warning_count, 5);
        assert_eq!(result.compatibility_score, 100.0);
    }

    #[test]
    fn fractional_scores_survive() {
        let result =
            DriftResult::from_output(0, r#"{"compatibilityScore": 87.5}"#).expect("valid report");
        assert_eq!(result.compatibility_score, 87.5);
    }

    #[test]
    fn non_json_stdout_is_malformed() {
        let err = DriftResult::from_output(0, "Drift detected: 3 breaking").expect_err("not json");
        assert!(matches!(err, DriftError::MalformedReport { .. }));
    }

    #[test]
    fn non_object_json_is_malformed() {
        let err = DriftResult::from_output(0, "[1, 2, 3]").expect_err("array is not a report");
        assert!(matches!(err, DriftError::MalformedReport { .. }));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn non_integer_counts_fall_back_to_zero_and_are_logged() {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            DriftResult::from_output(1, r#"{"summary": {"breaking": 3.0, "warning": -1}}"#)
                .expect("valid report")
        });

        assert_eq!(result.breaking_count, 0);
        assert_eq!(result.warning_count, 0);
        let text = String::from_utf8(logs.0.lock().expect("log buffer").clone()).expect("utf-8");
        assert!(text.contains("field=\"breaking\""), "{text}");
        assert!(text.contains("field=\"warning\""), "{text}");
        assert!(text.contains("summary count is not an unsigned integer"));
    }

    #[test]
    fn report_is_kept_verbatim() {
        let stdout = r#"{"hasBreakingChanges": false, "changes": [{"path": "user.email"}]}"#;
        let result = DriftResult::from_output(0, stdout).expect("valid report");
        assert_eq!(result.report["changes"][0]["path"], "user.email");
    }
}
