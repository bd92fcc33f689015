use super::{CommandOutput, CommandRunner};
use crate::error::{DriftError, Result};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs commands as real child processes with a hard deadline.
///
/// The deadline covers both the child's exit and the closing of its
/// output pipes, so a background grandchild that keeps stdout open
/// cannot stretch the call past `timeout`. On unix the child leads its
/// own process group and the whole group is killed on expiry.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> Result<CommandOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        tracing::debug!(program, ?args, timeout_secs = timeout.as_secs(), "spawning");
        let deadline = Instant::now() + timeout;
        let mut child = command.spawn().map_err(|source| DriftError::Spawn {
            program: program.to_owned(),
            source,
        })?;

        // Pipes are drained off-thread so a chatty child never blocks on a full buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => return Err(time_out(&mut child, program, timeout)),
            Err(source) => {
                kill_group(&mut child);
                let _ = child.wait();
                return Err(DriftError::Wait {
                    program: program.to_owned(),
                    source,
                });
            }
        };

        let stdout = match collect(stdout, deadline) {
            Ok(text) => text,
            Err(failure) => return Err(failure.into_error(&mut child, program, timeout)),
        };
        let stderr = match collect(stderr, deadline) {
            Ok(text) => text,
            Err(failure) => return Err(failure.into_error(&mut child, program, timeout)),
        };

        let Some(exit_code) = status.code() else {
            return Err(DriftError::Terminated {
                program: program.to_owned(),
            });
        };

        if !stderr.trim().is_empty() {
            tracing::debug!(program, stderr = %stderr.trim_end(), "stderr");
        }
        tracing::debug!(program, exit_code, stdout_bytes = stdout.len(), "exited");

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn time_out(child: &mut Child, program: &str, timeout: Duration) -> DriftError {
    kill_group(child);
    let _ = child.wait();
    tracing::warn!(program, timeout_secs = timeout.as_secs(), "timed out; killed");
    DriftError::Timeout {
        program: program.to_owned(),
        timeout,
    }
}

/// Kill the child and anything it started in its process group.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let group = i32::try_from(child.id()).map(Pid::from_raw);
    match group {
        Ok(group) => {
            if let Err(errno) = killpg(group, Signal::SIGKILL) {
                tracing::debug!(%errno, "killpg failed; killing child only");
                let _ = child.kill();
            }
        }
        Err(_) => {
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}

type PipeRead = io::Result<Vec<u8>>;

fn drain<R>(pipe: Option<R>) -> Option<Receiver<PipeRead>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let read = pipe.read_to_end(&mut buffer).map(|_| buffer);
            let _ = sender.send(read);
        });
        receiver
    })
}

enum CollectFailure {
    Deadline,
    Read(io::Error),
}

impl CollectFailure {
    fn into_error(self, child: &mut Child, program: &str, timeout: Duration) -> DriftError {
        match self {
            // The child exited but something it started still holds the pipe.
            Self::Deadline => time_out(child, program, timeout),
            Self::Read(source) => DriftError::Wait {
                program: program.to_owned(),
                source,
            },
        }
    }
}

fn collect(
    receiver: Option<Receiver<PipeRead>>,
    deadline: Instant,
) -> std::result::Result<String, CollectFailure> {
    let Some(receiver) = receiver else {
        return Ok(String::new());
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    let bytes = match receiver.recv_timeout(remaining) {
        Ok(read) => read.map_err(CollectFailure::Read)?,
        Err(RecvTimeoutError::Timeout) => return Err(CollectFailure::Deadline),
        Err(RecvTimeoutError::Disconnected) => {
            return Err(CollectFailure::Read(io::Error::other(
                "pipe reader thread exited without a result",
            )));
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
