//! Comparison of rendered outputs
//!
//! [`DiffEngine`] classifies the difference between a flow's base and head
//! render directories. Side-by-side mode negotiates options with the diff
//! tool: tab expansion is requested first and dropped once if the tool
//! rejects it.

pub mod side_by_side;
pub mod tool;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::{DiffFormat, SideBySideLayout};
use crate::process::CommandOutput;

pub use side_by_side::{find_marker, suppress_unchanged, Marker, MarkedLine};
pub use tool::{DiffTool, SystemDiffTool};

/// Banner `diff -r` prints before each compared file pair
const SIDE_BY_SIDE_BANNER: &str = "diff --recursive --side-by-side ";

const UNSUPPORTED_OPTION_HINTS: [&str; 3] =
    ["unrecognized option", "illegal option", "unknown option"];

/// Classified comparison of one flow's two render directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// No differences
    Identical,
    /// Differences, with the (label-rewritten) diff text
    Differs(String),
    /// The tool failed for this flow
    ToolingError,
}

/// Side-by-side option sets, tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negotiation {
    ExpandTabs,
    PlainTabs,
}

impl Negotiation {
    const fn expand_tabs(self) -> bool {
        matches!(self, Self::ExpandTabs)
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::ExpandTabs => Some(Self::PlainTabs),
            Self::PlainTabs => None,
        }
    }
}

/// Runs and classifies diffs through a [`DiffTool`]
#[derive(Debug)]
pub struct DiffEngine<D> {
    tool: D,
}

impl<D: DiffTool> DiffEngine<D> {
    /// Wrap a diff tool
    pub const fn new(tool: D) -> Self {
        Self { tool }
    }

    /// Access the wrapped tool
    pub const fn tool(&self) -> &D {
        &self.tool
    }

    /// Compare `base_dir` with `head_dir` for `flow_path`.
    ///
    /// `Err` means the run cannot continue: the tool could not be launched,
    /// or it rejected every side-by-side option set.
    pub async fn diff(
        &self,
        workdir: &Path,
        flow_path: &str,
        base_dir: &Path,
        head_dir: &Path,
        format: DiffFormat,
        layout: &SideBySideLayout,
    ) -> Result<DiffOutcome> {
        let outcome = match format {
            DiffFormat::Unified => {
                let output = self
                    .tool
                    .unified(workdir, flow_path, base_dir, head_dir)
                    .await?;
                classify(&output, output.stdout_text())
            }
            DiffFormat::SideBySide => {
                self.side_by_side(workdir, flow_path, base_dir, head_dir, layout)
                    .await?
            }
        };
        tracing::debug!(flow = flow_path, %format, outcome = outcome_name(&outcome), "compared renders");
        Ok(outcome)
    }

    async fn side_by_side(
        &self,
        workdir: &Path,
        flow_path: &str,
        base_dir: &Path,
        head_dir: &Path,
        layout: &SideBySideLayout,
    ) -> Result<DiffOutcome> {
        let mut negotiation = Some(Negotiation::ExpandTabs);
        while let Some(current) = negotiation {
            let output = self
                .tool
                .side_by_side(workdir, base_dir, head_dir, layout, current.expand_tabs())
                .await?;

            if output.exit_code == Some(2) && option_unsupported(&output.stderr_text()) {
                tracing::debug!(flow = flow_path, options = ?current, "diff rejected options");
                negotiation = current.next();
                continue;
            }

            let text = rewrite_labels(&output.stdout_text(), flow_path, base_dir, head_dir);
            return Ok(classify(&output, strip_banners(&text)));
        }

        bail!("side-by-side diff options are not supported by the diff tool")
    }
}

fn classify(output: &CommandOutput, text: String) -> DiffOutcome {
    match output.exit_code {
        Some(0) => DiffOutcome::Identical,
        Some(1) => DiffOutcome::Differs(text),
        _ => DiffOutcome::ToolingError,
    }
}

const fn outcome_name(outcome: &DiffOutcome) -> &'static str {
    match outcome {
        DiffOutcome::Identical => "identical",
        DiffOutcome::Differs(_) => "differs",
        DiffOutcome::ToolingError => "tooling-error",
    }
}

fn option_unsupported(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    UNSUPPORTED_OPTION_HINTS
        .iter()
        .any(|hint| lower.contains(hint))
}

/// Replace snapshot render paths with `a/<flow>` and `b/<flow>`.
fn rewrite_labels(text: &str, flow_path: &str, base_dir: &Path, head_dir: &Path) -> String {
    let base = base_dir.to_string_lossy();
    let head = head_dir.to_string_lossy();
    text.replace(base.as_ref(), &format!("a/{flow_path}"))
        .replace(head.as_ref(), &format!("b/{flow_path}"))
}

fn strip_banners(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.split('\n')
        .filter(|line| !line.starts_with(SIDE_BY_SIDE_BANNER))
        .collect::<Vec<_>>()
        .join("\n")
}
