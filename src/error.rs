use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Infrastructure failures raised while invoking the drift tool.
///
/// Drift itself is never an error: a non-zero tool exit is reported
/// through [`crate::DriftResult::has_drift`].
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("endpoint key must not be empty")]
    EmptyKey,

    #[error("invalid input: {detail}")]
    BadInput { detail: String },

    #[error("failed to serialize response payload: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("temp file {op} failed: {source}")]
    TempFile {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("`{program}` was terminated without an exit code")]
    Terminated { program: String },

    #[error("drift report is not valid JSON: {source}")]
    MalformedReport {
        #[source]
        source: serde_json::Error,
        stdout: String,
    },

    #[error("request to {url} failed: {detail}")]
    Network { url: String, detail: String },

    #[error("request to {url} returned status {status}, expected {expected}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        expected: u16,
    },

    #[error("cannot read payload {}: {source}", .path.display())]
    ReadPayload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DriftError {
    /// True for the errors that come from the tool process itself
    /// rather than from local preparation.
    pub fn is_process_failure(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. } | Self::Wait { .. } | Self::Timeout { .. } | Self::Terminated { .. }
        )
    }
}

pub type Result<T, E = DriftError> = std::result::Result<T, E>;
