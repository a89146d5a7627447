//! Text-diff tool invocation
//!
//! Unified output comes from `git diff --no-index`; side-by-side output from
//! the system `diff`. Both use the 0 (identical) / 1 (differs) / 2 (trouble)
//! exit convention.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;

use crate::config::SideBySideLayout;
use crate::process::{run_command, CommandOutput};

/// Narrow interface over the external diff tools
#[allow(async_fn_in_trait)]
pub trait DiffTool {
    /// Unified two-directory diff with `a/<flow>/` and `b/<flow>/` labels.
    async fn unified(
        &self,
        workdir: &Path,
        flow_path: &str,
        base_dir: &Path,
        head_dir: &Path,
    ) -> Result<CommandOutput>;

    /// Recursive side-by-side diff, optionally expanding tabs.
    async fn side_by_side(
        &self,
        workdir: &Path,
        base_dir: &Path,
        head_dir: &Path,
        layout: &SideBySideLayout,
        expand_tabs: bool,
    ) -> Result<CommandOutput>;
}

/// `DiffTool` backed by `git` and `diff` executables
#[derive(Debug, Clone)]
pub struct SystemDiffTool {
    git: String,
    diff: String,
    timeout: Option<Duration>,
}

impl SystemDiffTool {
    /// Create a tool driving the given executables
    #[must_use]
    pub fn new(git: impl Into<String>, diff: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            git: git.into(),
            diff: diff.into(),
            timeout,
        }
    }

    fn unified_command(&self, workdir: &Path, flow_path: &str, base_dir: &Path, head_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.current_dir(workdir)
            .args(["diff", "--no-index", "--no-color"])
            .arg(format!("--src-prefix=a/{flow_path}/"))
            .arg(format!("--dst-prefix=b/{flow_path}/"))
            .arg("--")
            .arg(base_dir)
            .arg(head_dir);
        cmd
    }

    fn side_by_side_command(
        &self,
        workdir: &Path,
        base_dir: &Path,
        head_dir: &Path,
        layout: &SideBySideLayout,
        expand_tabs: bool,
    ) -> Command {
        let mut cmd = Command::new(&self.diff);
        cmd.current_dir(workdir)
            .args(["--recursive", "--side-by-side", "--new-file"])
            .arg(format!("--width={}", layout.width))
            .arg(format!("--tabsize={}", layout.tab_size));
        if expand_tabs {
            cmd.arg("--expand-tabs");
        }
        cmd.arg(base_dir).arg(head_dir);
        cmd
    }
}

impl DiffTool for SystemDiffTool {
    async fn unified(
        &self,
        workdir: &Path,
        flow_path: &str,
        base_dir: &Path,
        head_dir: &Path,
    ) -> Result<CommandOutput> {
        let cmd = self.unified_command(workdir, flow_path, base_dir, head_dir);
        run_command(cmd, self.timeout).await
    }

    async fn side_by_side(
        &self,
        workdir: &Path,
        base_dir: &Path,
        head_dir: &Path,
        layout: &SideBySideLayout,
        expand_tabs: bool,
    ) -> Result<CommandOutput> {
        let cmd = self.side_by_side_command(workdir, base_dir, head_dir, layout, expand_tabs);
        run_command(cmd, self.timeout).await
    }
}
