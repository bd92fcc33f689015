pub mod args;
pub mod exit;

pub use args::{CheckArgs, Cli, Command, ExpectArgs, ProbeArgs, TargetArgs, ToolArgs};
pub use exit::{Outcome, exit_code};
