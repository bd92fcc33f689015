pub mod expect;
pub mod invoker;
pub mod payload;
pub mod result;
pub mod tool;

pub use expect::{Expectations, Violation};
pub use invoker::{
    DEFAULT_FAIL_ON, DEFAULT_STORE, DriftCheck, check_schema_drift, check_schema_drift_raw,
};
pub use payload::TempPayload;
pub use result::{DEFAULT_COMPATIBILITY_SCORE, DriftResult, drift_detected};
pub use tool::{DEFAULT_RUNNER, DEFAULT_TIMEOUT, Tool, ToolConfig};
