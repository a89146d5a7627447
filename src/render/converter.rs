//! Flow-to-Apex converter invocation
//!
//! Builds the two command forms the converter supports: directory output
//! (`<bin> <flow> -d <dir>`) and stream output (`<bin> <flow>`).

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::process::{run_command, CommandOutput};

/// Narrow interface over the external converter
#[allow(async_fn_in_trait)]
pub trait Converter {
    /// Check that the converter can be launched at all.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// Convert `flow_file`, writing artifacts into `output_dir`.
    async fn render_to_dir(
        &self,
        workdir: &Path,
        flow_file: &Path,
        output_dir: &Path,
    ) -> Result<CommandOutput>;

    /// Convert `flow_file`, emitting generated source on stdout.
    async fn render_to_stdout(&self, workdir: &Path, flow_file: &Path) -> Result<CommandOutput>;
}

/// `Converter` backed by the `flow2apex` executable
#[derive(Debug, Clone)]
pub struct ConverterCli {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ConverterCli {
    /// Create a converter invoking `program` (a path or a name on `PATH`).
    ///
    /// A relative path is anchored at the current directory, since the
    /// converter is launched from inside a snapshot.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        let program = program.into();
        let program = match std::env::current_dir() {
            Ok(cwd) => anchor_program(program, &cwd),
            Err(_) => program,
        };
        Self { program, timeout }
    }

    /// Program the converter runs
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, workdir: &Path, flow_file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(workdir).arg(flow_file);
        cmd
    }
}

impl Converter for ConverterCli {
    fn ensure_available(&self) -> Result<()> {
        resolve_binary(&self.program.to_string_lossy()).map(|_| ())
    }

    async fn render_to_dir(
        &self,
        workdir: &Path,
        flow_file: &Path,
        output_dir: &Path,
    ) -> Result<CommandOutput> {
        let mut cmd = self.command(workdir, flow_file);
        cmd.arg("-d").arg(output_dir);
        run_command(cmd, self.timeout).await
    }

    async fn render_to_stdout(&self, workdir: &Path, flow_file: &Path) -> Result<CommandOutput> {
        run_command(self.command(workdir, flow_file), self.timeout).await
    }
}

/// Join a relative program path (one with a separator) onto `cwd`.
/// Bare names are left for `PATH` lookup.
fn anchor_program(program: PathBuf, cwd: &Path) -> PathBuf {
    if program.is_relative() && program.components().count() > 1 {
        cwd.join(program)
    } else {
        program
    }
}

/// Resolve the converter executable.
///
/// A value containing a path separator must point at an executable file;
/// a bare name is looked up on `PATH`. An empty value means `flow2apex`.
pub fn resolve_binary(requested: &str) -> Result<PathBuf> {
    let requested = match requested.trim() {
        "" => "flow2apex",
        trimmed => trimmed,
    };

    if requested.contains(std::path::MAIN_SEPARATOR) || requested.contains('/') {
        let path = PathBuf::from(requested);
        if !is_executable(&path) {
            bail!("FLOW2APEX_BIN is not executable: {requested}");
        }
        return Ok(path);
    }

    std::env::var_os("PATH")
        .iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join(requested))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| anyhow::anyhow!("{requested} binary not found on PATH"))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
