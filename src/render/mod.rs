//! Flow rendering
//!
//! Turns one flow file in one snapshot into a directory of generated Apex.
//! The converter is tried in directory mode first and in stream mode second;
//! the outcome is a value, so a broken flow only affects its own section of
//! the report.

pub mod converter;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::git::{RevisionSource, Snapshot};
use crate::process::CommandOutput;

pub use converter::{resolve_binary, Converter, ConverterCli};

/// File written when only stream mode produced output
pub const FALLBACK_ARTIFACT: &str = "generated.apex";

/// Result of rendering one flow at one revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Generated artifacts are in this directory
    Rendered(PathBuf),
    /// Both invocation modes failed; carries their combined stderr
    ConverterFailed(String),
    /// The flow does not exist at this revision (added or deleted)
    FileMissingAtRevision,
}

impl RenderOutcome {
    /// Whether artifacts were produced
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Directory,
    Stream,
}

impl Attempt {
    const fn next(self) -> Option<Self> {
        match self {
            Self::Directory => Some(Self::Stream),
            Self::Stream => None,
        }
    }
}

/// Renders flows through a [`Converter`]
#[derive(Debug)]
pub struct FlowRenderer<C> {
    converter: C,
}

impl<C: Converter> FlowRenderer<C> {
    /// Wrap a converter
    pub const fn new(converter: C) -> Self {
        Self { converter }
    }

    /// Access the wrapped converter
    pub const fn converter(&self) -> &C {
        &self.converter
    }

    /// Render `flow_path` from `snapshot` into `output_dir`.
    ///
    /// `output_dir` must already exist. Returns `Err` only for fatal
    /// problems: the converter cannot be launched, the flow file cannot be
    /// inspected, or the fallback artifact cannot be written.
    pub async fn render<S: RevisionSource>(
        &self,
        flow_path: &str,
        snapshot: &Snapshot<'_, S>,
        output_dir: &Path,
    ) -> Result<RenderOutcome> {
        let flow_file = snapshot.path_of(flow_path);
        match std::fs::metadata(&flow_file) {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    flow = flow_path,
                    revision = snapshot.revision(),
                    "flow file absent at revision"
                );
                return Ok(RenderOutcome::FileMissingAtRevision);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to stat flow file {flow_path}"));
            }
        }

        let mut log = String::new();
        let mut attempt = Some(Attempt::Directory);
        while let Some(current) = attempt {
            let output = self
                .invoke(current, snapshot.root(), &flow_file, output_dir)
                .await?;
            log.push_str(&output.stderr_text());

            if output.success() {
                if current == Attempt::Stream {
                    let artifact = output_dir.join(FALLBACK_ARTIFACT);
                    std::fs::write(&artifact, &output.stdout).with_context(|| {
                        format!("Failed to write fallback artifact {}", artifact.display())
                    })?;
                }
                tracing::debug!(flow = flow_path, mode = ?current, "rendered flow");
                return Ok(RenderOutcome::Rendered(output_dir.to_path_buf()));
            }

            tracing::debug!(
                flow = flow_path,
                mode = ?current,
                exit_code = ?output.exit_code,
                "converter attempt failed"
            );
            attempt = current.next();
        }

        tracing::warn!(
            flow = flow_path,
            revision = snapshot.revision(),
            "converter failed in both modes"
        );
        Ok(RenderOutcome::ConverterFailed(log))
    }

    async fn invoke(
        &self,
        attempt: Attempt,
        workdir: &Path,
        flow_file: &Path,
        output_dir: &Path,
    ) -> Result<CommandOutput> {
        match attempt {
            Attempt::Directory => {
                self.converter
                    .render_to_dir(workdir, flow_file, output_dir)
                    .await
            }
            Attempt::Stream => self.converter.render_to_stdout(workdir, flow_file).await,
        }
    }
}
