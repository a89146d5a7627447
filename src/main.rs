//! flowdiff - Generated-code diffs for changed flow definitions
//!
//! CLI entry point. Every flag falls back to the environment variable the CI
//! runner exports, so the binary can run as a workflow step without flags.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use flowdiff::cli::render_run_summary;
use flowdiff::{ConverterCli, DiffFormat, GitCli, Pipeline, RunConfig, RunRequest, SystemDiffTool};

/// Generated-code diff reporter for changed flow definitions
///
/// Renders every changed flow at the base and head revisions with
/// flow2apex and writes a pull-request comment with the differences.
#[derive(Parser, Debug)]
#[command(name = "flowdiff", version, about)]
struct Cli {
    /// Base commit id
    #[arg(long, env = "BASE_SHA", default_value = "")]
    base_sha: String,

    /// Head commit id
    #[arg(long, env = "HEAD_SHA", default_value = "")]
    head_sha: String,

    /// Repository root (current directory by default)
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Step output file receiving key=value lines
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Markdown comment output path
    #[arg(long)]
    comment_file: Option<PathBuf>,

    /// Side-by-side HTML output path
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Path or name of the flow2apex binary
    #[arg(long = "flow2apex-bin", env = "FLOW2APEX_BIN", default_value = "")]
    flow2apex_bin: String,

    /// Diff format: unified or side-by-side
    #[arg(long, env = "DIFF_FORMAT", default_value = "")]
    diff_format: String,

    /// Path to a flowdiff.toml configuration file
    #[arg(long, env = "FLOWDIFF_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Build the run request from flags, applying the `.github` defaults.
fn build_request(cli: &Cli) -> Result<RunRequest> {
    let format: DiffFormat = cli.diff_format.parse()?;
    let workspace = match non_empty(cli.workspace.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let mut request = RunRequest::new(&cli.base_sha, &cli.head_sha, workspace, format);
    if let Some(path) = non_empty(cli.output_file.clone()) {
        request.output_file = path;
    }
    if let Some(path) = non_empty(cli.comment_file.clone()) {
        request.comment_file = path;
    }
    if let Some(path) = non_empty(cli.html_file.clone()) {
        request.html_file = path;
    }
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = match non_empty(cli.config.clone()) {
        Some(path) => RunConfig::from_path(&path)?,
        None => RunConfig::default(),
    };
    let request = build_request(&cli)?;

    let timeout = config.tools.timeout();
    let converter_bin = match cli.flow2apex_bin.trim() {
        "" => "flow2apex",
        bin => bin,
    };
    let pipeline = Pipeline::new(
        GitCli::new(&request.workspace, config.tools.git.clone(), timeout),
        ConverterCli::new(converter_bin, timeout),
        SystemDiffTool::new(config.tools.git.clone(), config.tools.diff.clone(), timeout),
        config,
    );

    tracing::info!(
        base = request.base.as_str(),
        head = request.head.as_str(),
        format = %request.format,
        workspace = %request.workspace.display(),
        "starting flow diff"
    );
    let summary = pipeline.run(&request).await?;
    render_run_summary(&summary);

    Ok(())
}
