use super::codes::RefusalCode;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::DriftError;
use crate::output::RECORD_VERSION;

#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
pub struct RefusalEnvelope {
    pub version: &'static str,
    pub outcome: &'static str,
    pub refusal: Refusal,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
pub struct Refusal {
    pub code: &'static str,
    pub message: String,
    pub detail: Value,
    pub next_command: Option<String>,
}

impl RefusalEnvelope {
    pub fn new(code: RefusalCode, message: impl Into<String>, detail: Value) -> Self {
        Self {
            version: RECORD_VERSION,
            outcome: "REFUSAL",
            refusal: Refusal {
                code: code.as_str(),
                message: message.into(),
                detail,
                next_command: None,
            },
        }
    }

    pub fn from_code(code: RefusalCode, detail: Value) -> Self {
        Self::new(code, code.default_message(), detail)
    }

    pub fn from_error(error: &DriftError) -> Self {
        let code = RefusalCode::for_error(error);
        let mut detail = json!({ "error": error.to_string() });
        match error {
            DriftError::Spawn { program, .. } => {
                detail["program"] = json!(program);
                return Self::from_code(code, detail)
                    .with_next_command(format!("{program} --version"));
            }
            DriftError::Timeout { program, timeout } => {
                detail["program"] = json!(program);
                detail["timeout_secs"] = json!(timeout.as_secs());
            }
            DriftError::MalformedReport { stdout, .. } => {
                detail["stdout"] = json!(stdout);
            }
            DriftError::UnexpectedStatus {
                url,
                status,
                expected,
            } => {
                detail["url"] = json!(url);
                detail["status"] = json!(status);
                detail["expected"] = json!(expected);
            }
            DriftError::Network { url, .. } => {
                detail["url"] = json!(url);
            }
            DriftError::ReadPayload { path, .. } => {
                detail["path"] = json!(path.display().to_string());
            }
            _ => {}
        }
        Self::from_code(code, detail)
    }

    pub fn with_next_command(mut self, command: impl Into<String>) -> Self {
        self.refusal.next_command = Some(command.into());
        self
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
