use serde::{Deserialize, Serialize};

use crate::drift::{DriftResult, Violation};

pub const RECORD_VERSION: &str = "driftcheck.v0";

/// One line of `driftcheck` stdout for a completed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub version: String,
    pub key: String,
    pub outcome: String,
    #[serde(flatten)]
    pub result: DriftResult,
    pub violations: Vec<String>,
    pub tool_versions: serde_json::Map<String, serde_json::Value>,
}

impl CheckRecord {
    pub fn new(key: &str, outcome: &str, result: DriftResult, violations: &[Violation]) -> Self {
        let mut tool_versions = serde_json::Map::new();
        tool_versions.insert(
            "driftcheck".to_owned(),
            serde_json::Value::String(env!("CARGO_PKG_VERSION").to_owned()),
        );

        Self {
            version: RECORD_VERSION.to_owned(),
            key: key.to_owned(),
            outcome: outcome.to_owned(),
            result,
            violations: violations
                .iter()
                .map(|violation| violation.for_key(key))
                .collect(),
            tool_versions,
        }
    }
}
