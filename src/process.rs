//! External process execution
//!
//! Every tool this crate drives (git, the converter, diff) goes through
//! [`run_command`]. Output is captured as raw bytes because converter stdout
//! is persisted verbatim as a generated artifact.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::process::Command as TokioCommand;

/// Captured result of one external invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed or ran past its deadline
    pub exit_code: Option<i32>,
    /// Captured stdout
    pub stdout: Vec<u8>,
    /// Captured stderr
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Build an output with the given exit code and text streams.
    #[must_use]
    pub fn new(exit_code: Option<i32>, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status 0
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Stdout decoded lossily as UTF-8
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily as UTF-8
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a command to completion, capturing stdout and stderr.
///
/// Returns `Err` only when the process cannot be started (binary missing,
/// not executable). A non-zero exit is reported through
/// [`CommandOutput::exit_code`]. When `timeout` elapses the child is killed
/// and the output carries no exit code plus a note on stderr.
pub async fn run_command(
    cmd: std::process::Command,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut tokio_cmd = TokioCommand::from(cmd);
    tokio_cmd.stdin(Stdio::null());
    tokio_cmd.stdout(Stdio::piped());
    tokio_cmd.stderr(Stdio::piped());
    tokio_cmd.kill_on_drop(true);

    let start = Instant::now();
    let child = tokio_cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {program}"))?;

    let waited = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            Err(_) => {
                tracing::warn!(program = program.as_str(), secs = limit.as_secs(), "process timed out");
                return Ok(CommandOutput::new(
                    None,
                    Vec::new(),
                    format!("{program} timed out after {}s\n", limit.as_secs()),
                ));
            }
        },
        None => child.wait_with_output().await,
    };
    let output = waited.with_context(|| format!("Failed waiting for {program}"))?;

    tracing::debug!(
        program = program.as_str(),
        exit_code = ?output.status.code(),
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "process finished"
    );

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
