//! flowdiff - Generated-code diffs for changed flow definitions
//!
//! Given two revisions of a repository, flowdiff finds the flow files that
//! changed, renders each one at both revisions through the external
//! `flow2apex` converter, diffs the generated Apex and writes a Markdown
//! pull-request comment (plus an HTML side-by-side report on request).

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod git;
pub mod pipeline;
pub mod process;
pub mod render;
pub mod report;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use config::{DiffFormat, RunConfig, SideBySideLayout};
pub use diff::{DiffEngine, DiffOutcome, DiffTool, SystemDiffTool};
pub use git::{GitCli, RevisionSource, Snapshot};
pub use pipeline::{Pipeline, RunRequest, RunSummary};
pub use render::{ConverterCli, Converter, FlowRenderer, RenderOutcome};
pub use report::{Report, ReportBuilder, RunOutputs};
