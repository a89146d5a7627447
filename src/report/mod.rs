//! Report assembly
//!
//! [`ReportBuilder`] turns per-flow outcomes into the Markdown pull-request
//! comment and, in side-by-side mode, the HTML report. Sections are appended
//! in change-set order; size caps are applied per log, per diff and once to
//! the whole comment, always with a visible marker.

pub mod html;
pub mod outputs;

use crate::config::{DiffFormat, ReportLimits, SideBySideLayout};
use crate::diff::{suppress_unchanged, DiffOutcome};
use crate::render::RenderOutcome;

pub use html::{html_escape, HtmlReport};
pub use outputs::RunOutputs;

const NO_DIFFERENCES: &str = "No generated Apex differences.";
const DIFF_FAILED: &str = "Failed to generate diff output.";
const LOG_TRUNCATED: &str = "\n...log truncated...";
const DIFF_TRUNCATED: &str = "\n...diff truncated...";
const COMMENT_TRUNCATED: &str = "\n...comment truncated due to size limit...\n";

/// Hidden marker identifying a previous comment of the same format
#[must_use]
pub fn comment_marker(format: DiffFormat) -> String {
    format!("<!-- flow2apex-diff-comment:{format} -->")
}

/// Longest prefix of `text` no longer than `max` bytes that ends on a
/// character boundary.
#[must_use]
pub fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn truncate_with_marker(text: &str, max: usize, marker: &str) -> String {
    let kept = truncate_at_boundary(text, max);
    if kept.len() == text.len() {
        text.to_string()
    } else {
        format!("{kept}{marker}")
    }
}

/// Finished report bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Markdown comment, already size-capped
    pub markdown: String,
    /// HTML document, present only in side-by-side mode
    pub html: Option<String>,
}

/// Accumulates per-flow sections
#[derive(Debug)]
pub struct ReportBuilder {
    format: DiffFormat,
    limits: ReportLimits,
    layout: SideBySideLayout,
    markdown: String,
    html: Option<HtmlReport>,
}

impl ReportBuilder {
    /// Start a report comparing `base` with `head`
    #[must_use]
    pub fn new(
        format: DiffFormat,
        base: &str,
        head: &str,
        limits: ReportLimits,
        layout: SideBySideLayout,
    ) -> Self {
        let mut markdown = comment_marker(format);
        markdown.push('\n');
        markdown.push_str("## flow2apex Flow Diffs\n\n");
        markdown.push_str(&format!(
            "Compared generated Apex between base `{base}` and head `{head}` for changed flow files.\n\n"
        ));
        markdown.push_str(&format!("Diff format: `{format}`.\n\n"));

        let html = (format == DiffFormat::SideBySide).then(|| HtmlReport::new(base, head, layout));

        Self {
            format,
            limits,
            layout,
            markdown,
            html,
        }
    }

    /// Append the section for one flow.
    pub fn add_flow(
        &mut self,
        flow_path: &str,
        base: &RenderOutcome,
        head: &RenderOutcome,
        diff: &DiffOutcome,
    ) {
        self.markdown.push_str(&format!("### `{flow_path}`\n\n"));
        if !base.is_rendered() || !head.is_rendered() {
            self.push_conversion_issues(base, head);
        }

        match diff {
            DiffOutcome::Differs(text) => self.push_diff(flow_path, text),
            DiffOutcome::Identical => self.push_notice(flow_path, NO_DIFFERENCES),
            DiffOutcome::ToolingError => self.push_notice(flow_path, DIFF_FAILED),
        }
    }

    fn push_conversion_issues(&mut self, base: &RenderOutcome, head: &RenderOutcome) {
        self.markdown.push_str("Conversion issues:\n\n");
        match base {
            RenderOutcome::ConverterFailed(_) => self.markdown.push_str("- Base conversion failed\n"),
            RenderOutcome::FileMissingAtRevision => self
                .markdown
                .push_str("- Base flow file missing (added in PR)\n"),
            RenderOutcome::Rendered(_) => {}
        }
        match head {
            RenderOutcome::ConverterFailed(_) => self.markdown.push_str("- Head conversion failed\n"),
            RenderOutcome::FileMissingAtRevision => self
                .markdown
                .push_str("- Head flow file missing (deleted in PR)\n"),
            RenderOutcome::Rendered(_) => {}
        }
        self.markdown.push('\n');

        let logs: Vec<(&str, &str)> = [("base", base), ("head", head)]
            .into_iter()
            .filter_map(|(side, outcome)| match outcome {
                RenderOutcome::ConverterFailed(log) if !log.is_empty() => Some((side, log.as_str())),
                _ => None,
            })
            .collect();
        if logs.is_empty() {
            return;
        }

        self.markdown.push_str("```text\n");
        for (side, log) in logs {
            let log = truncate_with_marker(log, self.limits.max_log_chars, LOG_TRUNCATED);
            self.markdown.push_str(&format!("[{side}]\n{log}"));
            if !log.ends_with('\n') {
                self.markdown.push('\n');
            }
        }
        self.markdown.push_str("```\n\n");
    }

    fn push_diff(&mut self, flow_path: &str, text: &str) {
        let (fence, shown) = match self.format {
            DiffFormat::Unified => ("diff", text.to_string()),
            DiffFormat::SideBySide => ("text", suppress_unchanged(text, &self.layout)),
        };
        if let Some(html) = self.html.as_mut() {
            html.push_diff(flow_path, text);
        }

        let shown = truncate_with_marker(&shown, self.limits.max_diff_chars, DIFF_TRUNCATED);
        self.markdown.push_str(&format!("```{fence}\n{shown}"));
        if !shown.ends_with('\n') {
            self.markdown.push('\n');
        }
        self.markdown.push_str("```\n\n");
    }

    fn push_notice(&mut self, flow_path: &str, notice: &str) {
        self.markdown.push_str(notice);
        self.markdown.push_str("\n\n");
        if let Some(html) = self.html.as_mut() {
            html.push_notice(flow_path, notice);
        }
    }

    /// Apply the comment size cap and close the HTML document.
    #[must_use]
    pub fn finish(self) -> Report {
        let max = self.limits.max_comment_chars;
        let markdown = if self.markdown.len() > max {
            tracing::warn!(
                size = self.markdown.len(),
                max,
                "comment exceeds size limit, truncating"
            );
            format!("{}{COMMENT_TRUNCATED}", truncate_at_boundary(&self.markdown, max))
        } else {
            self.markdown
        };

        Report {
            markdown,
            html: self.html.map(HtmlReport::finish),
        }
    }
}
