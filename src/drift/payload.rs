use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{DriftError, Result};

const PREFIX: &str = "schema-check-";
const SUFFIX: &str = ".json";

/// Response payload staged on disk for the tool to read.
///
/// The file is unlinked when the guard is dropped, on every path.
#[derive(Debug)]
pub struct TempPayload {
    file: NamedTempFile,
}

impl TempPayload {
    pub fn json<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let mut file = create()?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer(&mut writer, value).map_err(DriftError::Serialize)?;
            writer.flush().map_err(|source| DriftError::TempFile {
                op: "write",
                source,
            })?;
        }
        Ok(Self { file })
    }

    /// Stage a response body exactly as received.
    pub fn raw(body: &str) -> Result<Self> {
        let mut file = create()?;
        file.write_all(body.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| DriftError::TempFile {
                op: "write",
                source,
            })?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the file now, logging rather than failing if the unlink does.
    pub fn close(self) {
        let path = self.path().to_path_buf();
        if let Err(error) = self.file.close() {
            tracing::warn!(path = %path.display(), %error, "failed to remove payload file");
        }
    }
}

fn create() -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(PREFIX)
        .suffix(SUFFIX)
        .tempfile()
        .map_err(|source| DriftError::TempFile {
            op: "create",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::fs;

    #[test]
    fn json_payload_round_trips_through_disk() {
        let body = json!({ "id": 1, "name": "Ada" });
        let payload = TempPayload::json(&body).expect("stage payload");

        let on_disk: Value =
            serde_json::from_str(&fs::read_to_string(payload.path()).expect("read payload"))
                .expect("payload is json");
        assert_eq!(on_disk, body);
    }

    #[test]
    fn file_name_carries_prefix_and_json_suffix() {
        let payload = TempPayload::raw("{}").expect("stage payload");
        let name = payload
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .expect("utf-8 file name");
        assert!(name.starts_with(PREFIX));
        assert!(name.ends_with(SUFFIX));
    }

    #[test]
    fn raw_payload_is_written_verbatim() {
        let body = "{ \"id\" : 1 }\n";
        let payload = TempPayload::raw(body).expect("stage payload");
        assert_eq!(fs::read_to_string(payload.path()).expect("read"), body);
    }

    #[test]
    fn drop_removes_the_file() {
        let payload = TempPayload::raw("{}").expect("stage payload");
        let path = payload.path().to_path_buf();
        assert!(path.exists());
        drop(payload);
        assert!(!path.exists());
    }

    #[test]
    fn close_removes_the_file() {
        let payload = TempPayload::raw("{}").expect("stage payload");
        let path = payload.path().to_path_buf();
        payload.close();
        assert!(!path.exists());
    }

    #[test]
    fn each_payload_gets_its_own_file() {
        let first = TempPayload::raw("{}").expect("first");
        let second = TempPayload::raw("{}").expect("second");
        assert_ne!(first.path(), second.path());
    }
}
