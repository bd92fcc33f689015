pub mod jsonl;
pub mod record;

pub use jsonl::{write_json_line, write_pretty};
pub use record::{CheckRecord, RECORD_VERSION};
