pub mod process;

pub use process::ProcessRunner;

use crate::error::Result;
use std::time::Duration;

/// Captured result of one external command run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Seam between the invoker and the operating system.
///
/// Implementations must return `Err` when the program could not be run
/// to completion (spawn failure, timeout, signal), and `Ok` with the
/// exit code whenever the program exited on its own, including with a
/// non-zero status.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
        (**self).run(program, args, timeout)
    }
}
