pub mod reader;

pub use reader::{PayloadSource, parse_payload};
