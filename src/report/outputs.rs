//! Step outputs for the invoking CI job

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Named results appended to the step output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutputs {
    /// Whether any flow file changed between the revisions
    pub has_flow_changes: bool,
    /// Where the Markdown comment was written
    pub comment_file: PathBuf,
    /// Where the HTML report was written; `None` in unified mode
    pub html_file: Option<PathBuf>,
}

impl RunOutputs {
    /// The `key=value` lines in output order
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let html = self
            .html_file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        vec![
            format!("has_flow_changes={}", self.has_flow_changes),
            format!("comment_file={}", self.comment_file.display()),
            format!("html_file={html}"),
        ]
    }

    /// Append the outputs to `path`, creating it if needed.
    pub fn append_to(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open output file {}", path.display()))?;
        for line in self.lines() {
            writeln!(file, "{line}")
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
        }
        Ok(())
    }
}
