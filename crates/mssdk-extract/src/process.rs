//! Child process execution with a deadline and cooperative cancellation.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{ExtractError, ExtractResult};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Run `command` to completion, killing it when `timeout` elapses or
/// `cancel` fires. Stdout is discarded; stderr is captured for error
/// classification.
pub(crate) fn run_bounded(
    mut command: Command,
    operation: &'static str,
    timeout: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> ExtractResult<CommandOutput> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(ExtractError::Cancelled);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    let program = command.get_program().to_owned();
    let mut child = command.spawn().map_err(|e| ExtractError::Git {
        operation,
        detail: format!("failed to run {}: {e}", display(&program)),
    })?;

    // Drain stderr concurrently so a chatty child never blocks on a full pipe.
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let started = Instant::now();
    loop {
        let polled = child.try_wait().map_err(|e| ExtractError::Git {
            operation,
            detail: format!("failed to wait for {}: {e}", display(&program)),
        })?;
        if let Some(status) = polled {
            let stderr = reader.join().unwrap_or_default();
            return Ok(CommandOutput { status, stderr });
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            terminate(&mut child);
            return Err(ExtractError::Cancelled);
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                terminate(&mut child);
                return Err(ExtractError::TimedOut {
                    seconds: limit.as_secs(),
                });
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!(error = %e, "failed to kill child process");
    }
    let _ = child.wait();
}

fn display(program: &OsStr) -> String {
    program.to_string_lossy().into_owned()
}
