use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{DriftError, Result};

/// Where the response payload comes from on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Stdin,
    File(PathBuf),
}

impl PayloadSource {
    /// `None` and `-` both mean stdin.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path != Path::new("-") => Self::File(path.to_path_buf()),
            _ => Self::Stdin,
        }
    }

    pub fn read_text(&self) -> Result<String> {
        match self {
            Self::Stdin => read_all(&mut io::stdin().lock(), Path::new("<stdin>")),
            Self::File(path) => fs::read_to_string(path).map_err(|source| DriftError::ReadPayload {
                path: path.clone(),
                source,
            }),
        }
    }
}

pub fn read_all<R: Read>(reader: &mut R, label: &Path) -> Result<String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| DriftError::ReadPayload {
            path: label.to_path_buf(),
            source,
        })?;
    Ok(text)
}

/// Parse a response payload. Blank input is refused rather than checked
/// as `null`, since the tool would record a meaningless baseline.
pub fn parse_payload(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(DriftError::BadInput {
            detail: "response payload is empty".to_owned(),
        });
    }
    serde_json::from_str::<Value>(text).map_err(|error| DriftError::BadInput {
        detail: format!("response payload is not JSON: {error}"),
    })
}
