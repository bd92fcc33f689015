use serde::Serialize;
use std::time::Duration;

use super::payload::TempPayload;
use super::result::DriftResult;
use super::tool::ToolConfig;
use crate::error::{DriftError, Result};
use crate::runner::{CommandRunner, ProcessRunner};

pub const DEFAULT_STORE: &str = "./schemas";
pub const DEFAULT_FAIL_ON: &str = "breaking";

/// One drift check against a logical endpoint key.
///
/// ```no_run
/// use driftcheck::DriftCheck;
/// use serde_json::json;
///
/// let result = DriftCheck::new("GET /api/v2/users/:id")
///     .store("./schemas")
///     .run(&json!({ "id": 1, "name": "Ada" }))?;
/// assert!(!result.has_breaking);
/// # Ok::<(), driftcheck::DriftError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftCheck {
    key: String,
    store: String,
    fail_on: String,
    tool: ToolConfig,
}

impl DriftCheck {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            store: DEFAULT_STORE.to_owned(),
            fail_on: DEFAULT_FAIL_ON.to_owned(),
            tool: ToolConfig::default(),
        }
    }

    pub fn store(mut self, store: impl Into<String>) -> Self {
        self.store = store.into();
        self
    }

    pub fn fail_on(mut self, fail_on: impl Into<String>) -> Self {
        self.fail_on = fail_on.into();
        self
    }

    pub fn tool(mut self, tool: ToolConfig) -> Self {
        self.tool = tool;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.tool.timeout = timeout;
        self
    }

    pub fn run<T>(&self, response: &T) -> Result<DriftResult>
    where
        T: Serialize + ?Sized,
    {
        self.run_with(&ProcessRunner::new(), response)
    }

    pub fn run_raw(&self, body: &str) -> Result<DriftResult> {
        self.run_raw_with(&ProcessRunner::new(), body)
    }

    pub fn run_with<R, T>(&self, runner: &R, response: &T) -> Result<DriftResult>
    where
        R: CommandRunner + ?Sized,
        T: Serialize + ?Sized,
    {
        self.ensure_key()?;
        let payload = TempPayload::json(response)?;
        self.invoke(runner, payload)
    }

    pub fn run_raw_with<R>(&self, runner: &R, body: &str) -> Result<DriftResult>
    where
        R: CommandRunner + ?Sized,
    {
        self.ensure_key()?;
        let payload = TempPayload::raw(body)?;
        self.invoke(runner, payload)
    }

    fn ensure_key(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(DriftError::EmptyKey);
        }
        Ok(())
    }

    // `payload` is dropped on every return path, including `?`.
    fn invoke<R>(&self, runner: &R, payload: TempPayload) -> Result<DriftResult>
    where
        R: CommandRunner + ?Sized,
    {
        let span = tracing::info_span!("drift_check", key = %self.key, tool = %self.tool.tool);
        let _entered = span.enter();

        let (program, args) =
            self.tool
                .check_command(&self.key, payload.path(), &self.store, &self.fail_on);
        let output = runner.run(&program, &args, self.tool.timeout)?;
        let result = DriftResult::from_output(output.exit_code, &output.stdout)?;

        tracing::info!(
            exit_code = result.exit_code,
            has_drift = result.has_drift,
            breaking = result.breaking_count,
            warning = result.warning_count,
            compatibility = result.compatibility_score,
            "drift check finished"
        );

        payload.close();
        Ok(result)
    }
}

/// Check `response` for drift against the baseline stored under `key`.
pub fn check_schema_drift<T>(
    key: &str,
    response: &T,
    store: &str,
    fail_on: &str,
) -> Result<DriftResult>
where
    T: Serialize + ?Sized,
{
    DriftCheck::new(key)
        .store(store)
        .fail_on(fail_on)
        .run(response)
}

/// Like [`check_schema_drift`], for a response body already in text form.
pub fn check_schema_drift_raw(
    key: &str,
    body: &str,
    store: &str,
    fail_on: &str,
) -> Result<DriftResult> {
    DriftCheck::new(key)
        .store(store)
        .fail_on(fail_on)
        .run_raw(body)
}
