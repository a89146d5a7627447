//! Version-control access
//!
//! The pipeline reaches git only through [`RevisionSource`]: a name-only
//! diff between two revisions and creation/removal of detached worktrees.
//! [`GitCli`] is the production implementation.

pub mod changes;
pub mod worktree;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::process::{run_command, CommandOutput};

pub use changes::{detect_changed_flows, is_flow_path};
pub use worktree::Snapshot;

/// Narrow interface over the version-control subsystem
#[allow(async_fn_in_trait)]
pub trait RevisionSource {
    /// Paths added, modified, renamed (new path) or deleted between revisions.
    async fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>>;

    /// Materialize `revision` as a detached working copy at `dir`.
    async fn materialize(&self, revision: &str, dir: &Path) -> Result<()>;

    /// Remove a working copy created by [`RevisionSource::materialize`].
    ///
    /// Synchronous so it can run from a drop guard on any exit path.
    fn release(&self, dir: &Path) -> Result<()>;
}

/// `RevisionSource` backed by the `git` command line
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
    git: String,
    timeout: Option<Duration>,
}

impl GitCli {
    /// Create a git accessor rooted at `repo_root`
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, git: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            repo_root: repo_root.into(),
            git: git.into(),
            timeout,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.current_dir(&self.repo_root);
        cmd
    }
}

impl RevisionSource for GitCli {
    async fn changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let mut cmd = self.command();
        cmd.args([
            "diff",
            "--name-only",
            "--no-renames",
            "--diff-filter=ACMRD",
            base,
            head,
        ]);
        let output = run_command(cmd, self.timeout)
            .await
            .context("Failed to detect changed files")?;
        if !output.success() {
            bail!(
                "Failed to detect changed files: {}",
                failure_message(&output)
            );
        }
        Ok(output.stdout_text().lines().map(str::to_string).collect())
    }

    async fn materialize(&self, revision: &str, dir: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(["worktree", "add", "--detach"]).arg(dir).arg(revision);
        let output = run_command(cmd, self.timeout)
            .await
            .with_context(|| format!("Failed to create worktree for {revision}"))?;
        if !output.success() {
            bail!(
                "Failed to create worktree for {revision}: {}",
                failure_message(&output)
            );
        }
        Ok(())
    }

    fn release(&self, dir: &Path) -> Result<()> {
        let output = self
            .command()
            .args(["worktree", "remove", "--force"])
            .arg(dir)
            .output()
            .with_context(|| format!("Failed to remove worktree {}", dir.display()))?;
        if output.status.success() || !dir.exists() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim();
        if message.is_empty() {
            bail!(
                "Failed to remove worktree {}: {}",
                dir.display(),
                output.status
            );
        }
        bail!("Failed to remove worktree {}: {message}", dir.display());
    }
}

fn failure_message(output: &CommandOutput) -> String {
    let stderr = output.stderr_text();
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        output
            .exit_code
            .map_or_else(|| "terminated".to_string(), |c| format!("exit code {c}"))
    } else {
        trimmed.to_string()
    }
}
