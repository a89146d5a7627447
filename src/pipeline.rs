//! Run orchestration
//!
//! A [`Pipeline`] owns the three tool seams and the run configuration. One
//! call to [`Pipeline::run`] detects changed flows, renders each at both
//! revisions, diffs the renders and writes the report artifacts plus the
//! step outputs. Flows are processed one at a time in change-set order.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::{DiffFormat, RunConfig};
use crate::diff::{DiffEngine, DiffOutcome, DiffTool};
use crate::git::{detect_changed_flows, RevisionSource, Snapshot};
use crate::render::{Converter, FlowRenderer, RenderOutcome};
use crate::report::{ReportBuilder, RunOutputs};

/// Prefix of the run-scoped temporary directory
pub const TEMP_PREFIX: &str = "flowdiff-";

/// Inputs of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Base revision id
    pub base: String,
    /// Head revision id
    pub head: String,
    /// Repository root; external diff tools run here
    pub workspace: PathBuf,
    /// Comparison format
    pub format: DiffFormat,
    /// Markdown comment destination
    pub comment_file: PathBuf,
    /// HTML report destination (written in side-by-side mode only)
    pub html_file: PathBuf,
    /// Step output file that receives `key=value` lines
    pub output_file: PathBuf,
}

impl RunRequest {
    /// A request with the conventional artifact paths under `<workspace>/.github`
    #[must_use]
    pub fn new(base: &str, head: &str, workspace: impl Into<PathBuf>, format: DiffFormat) -> Self {
        let workspace = workspace.into();
        let github = workspace.join(".github");
        Self {
            base: base.to_string(),
            head: head.to_string(),
            comment_file: github.join("flow2apex-pr-comment.md"),
            html_file: github.join("flow2apex-pr-diff.html"),
            output_file: github.join("flow2apex-step-output.txt"),
            workspace,
            format,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.base.trim().is_empty() || self.head.trim().is_empty() {
            bail!("base-sha and head-sha are required");
        }
        Ok(())
    }

    fn html_output(&self) -> Option<PathBuf> {
        (self.format == DiffFormat::SideBySide).then(|| self.html_file.clone())
    }
}

/// Render status of one side of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideStatus {
    /// Artifacts produced
    Rendered,
    /// Converter failed in both modes
    Failed,
    /// File absent at this revision
    Missing,
}

impl From<&RenderOutcome> for SideStatus {
    fn from(outcome: &RenderOutcome) -> Self {
        match outcome {
            RenderOutcome::Rendered(_) => Self::Rendered,
            RenderOutcome::ConverterFailed(_) => Self::Failed,
            RenderOutcome::FileMissingAtRevision => Self::Missing,
        }
    }
}

/// Diff status of one flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    /// No differences
    Identical,
    /// Generated code differs
    Differs,
    /// The diff tool failed for this flow
    Failed,
}

impl From<&DiffOutcome> for DiffStatus {
    fn from(outcome: &DiffOutcome) -> Self {
        match outcome {
            DiffOutcome::Identical => Self::Identical,
            DiffOutcome::Differs(_) => Self::Differs,
            DiffOutcome::ToolingError => Self::Failed,
        }
    }
}

/// What happened to one flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSummary {
    /// Repository-relative flow path
    pub path: String,
    /// Base render status
    pub base: SideStatus,
    /// Head render status
    pub head: SideStatus,
    /// Diff status
    pub diff: DiffStatus,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Per-flow results in change-set order
    pub flows: Vec<FlowSummary>,
    /// Outputs written to the step output file
    pub outputs: RunOutputs,
}

/// Orchestrates one comparison run
#[derive(Debug)]
pub struct Pipeline<S, C, D> {
    source: S,
    renderer: FlowRenderer<C>,
    engine: DiffEngine<D>,
    config: RunConfig,
}

impl<S, C, D> Pipeline<S, C, D>
where
    S: RevisionSource,
    C: Converter,
    D: DiffTool,
{
    /// Assemble a pipeline from its tools and configuration
    pub const fn new(source: S, converter: C, diff_tool: D, config: RunConfig) -> Self {
        Self {
            source,
            renderer: FlowRenderer::new(converter),
            engine: DiffEngine::new(diff_tool),
            config,
        }
    }

    /// The revision source
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Execute a run.
    ///
    /// Per-flow converter and diff failures end up in the report; `Err` is
    /// reserved for conditions that make the whole run meaningless.
    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        request.validate()?;
        create_parent_dir(&request.comment_file)?;
        create_parent_dir(&request.html_file)?;
        create_parent_dir(&request.output_file)?;

        let flows = detect_changed_flows(&self.source, &request.base, &request.head).await?;
        if flows.is_empty() {
            tracing::info!("no flow files changed");
            std::fs::write(&request.comment_file, "").with_context(|| {
                format!("Failed to write comment file {}", request.comment_file.display())
            })?;
            return write_outputs(request, false, Vec::new());
        }

        self.renderer.converter().ensure_available()?;

        // Declared before the snapshots so it is removed after they are released.
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .context("Failed to create temp dir")?;
        let base_snapshot =
            Snapshot::create(&self.source, &request.base, temp.path().join("base-checkout")).await?;
        let head_snapshot =
            Snapshot::create(&self.source, &request.head, temp.path().join("head-checkout")).await?;

        let mut report = ReportBuilder::new(
            request.format,
            &request.base,
            &request.head,
            self.config.limits,
            self.config.side_by_side,
        );
        let mut summaries = Vec::with_capacity(flows.len());
        for (index, flow) in flows.iter().enumerate() {
            tracing::info!(flow = flow.as_str(), "processing flow");
            let safe = safe_name(flow);
            let base_dir = create_render_dir(temp.path(), "base", index, &safe)?;
            let head_dir = create_render_dir(temp.path(), "head", index, &safe)?;

            let base = self.renderer.render(flow, &base_snapshot, &base_dir).await?;
            let head = self.renderer.render(flow, &head_snapshot, &head_dir).await?;
            let diff = self
                .engine
                .diff(
                    &request.workspace,
                    flow,
                    &base_dir,
                    &head_dir,
                    request.format,
                    &self.config.side_by_side,
                )
                .await?;

            report.add_flow(flow, &base, &head, &diff);
            summaries.push(FlowSummary {
                path: flow.clone(),
                base: SideStatus::from(&base),
                head: SideStatus::from(&head),
                diff: DiffStatus::from(&diff),
            });
        }

        let report = report.finish();
        std::fs::write(&request.comment_file, &report.markdown).with_context(|| {
            format!("Failed to write comment file {}", request.comment_file.display())
        })?;
        if let Some(html) = &report.html {
            std::fs::write(&request.html_file, html).with_context(|| {
                format!("Failed to write html file {}", request.html_file.display())
            })?;
        }

        write_outputs(request, true, summaries)
    }
}

fn write_outputs(
    request: &RunRequest,
    has_flow_changes: bool,
    flows: Vec<FlowSummary>,
) -> Result<RunSummary> {
    let outputs = RunOutputs {
        has_flow_changes,
        comment_file: request.comment_file.clone(),
        html_file: request.html_output(),
    };
    outputs.append_to(&request.output_file)?;
    tracing::debug!(output_file = %request.output_file.display(), "wrote step outputs");
    Ok(RunSummary { flows, outputs })
}

/// Flow path flattened into a single directory-name component
#[must_use]
pub fn safe_name(flow_path: &str) -> String {
    flow_path.replace(['/', ' ', '\t', '\n', ':'], "_")
}

/// Fresh render directory; the index keeps flows whose safe names collide apart.
fn create_render_dir(root: &Path, side: &str, index: usize, safe: &str) -> Result<PathBuf> {
    let dir = root.join(format!("{side}-render-{index}-{safe}"));
    std::fs::create_dir(&dir)
        .with_context(|| format!("Failed to create {side} render dir {}", dir.display()))?;
    Ok(dir)
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display())),
        _ => Ok(()),
    }
}
