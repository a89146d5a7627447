//! Terminal summary of a run
//!
//! All output goes to stderr so stdout remains clean for piping.

use colored::Colorize;

use crate::pipeline::{DiffStatus, FlowSummary, RunSummary, SideStatus};

fn side_label(status: SideStatus) -> String {
    match status {
        SideStatus::Rendered => "rendered".green().to_string(),
        SideStatus::Failed => "failed".red().bold().to_string(),
        SideStatus::Missing => "absent".yellow().to_string(),
    }
}

fn diff_label(status: DiffStatus) -> String {
    match status {
        DiffStatus::Identical => "identical".dimmed().to_string(),
        DiffStatus::Differs => "differs".cyan().bold().to_string(),
        DiffStatus::Failed => "diff failed".red().bold().to_string(),
    }
}

/// One line describing a flow's base/head/diff status
#[must_use]
pub fn flow_line(flow: &FlowSummary) -> String {
    format!(
        "  {} {} {} {} {} {}",
        flow.path.bold(),
        "base:".dimmed(),
        side_label(flow.base),
        "head:".dimmed(),
        side_label(flow.head),
        diff_label(flow.diff)
    )
}

/// Closing one-line result
#[must_use]
pub fn result_line(summary: &RunSummary) -> String {
    if !summary.outputs.has_flow_changes {
        return format!("{} no flow changes", "DONE".green().bold());
    }

    let differing = summary
        .flows
        .iter()
        .filter(|f| f.diff == DiffStatus::Differs)
        .count();
    let problems = summary
        .flows
        .iter()
        .filter(|f| {
            f.base == SideStatus::Failed || f.head == SideStatus::Failed || f.diff == DiffStatus::Failed
        })
        .count();

    let status = if problems == 0 {
        "DONE".green().bold().to_string()
    } else {
        "DONE".yellow().bold().to_string()
    };
    let mut line = format!(
        "{status} {} flow(s), {differing} with differences",
        summary.flows.len()
    );
    if problems > 0 {
        line.push_str(&format!(", {problems} with problems"));
    }
    line.push_str(&format!(
        " {} {}",
        "→".dimmed(),
        summary.outputs.comment_file.display()
    ));
    line
}

/// Print the per-flow summary and the result line
pub fn render_run_summary(summary: &RunSummary) {
    if !summary.flows.is_empty() {
        eprintln!("{}", "─".repeat(50).dimmed());
        for flow in &summary.flows {
            eprintln!("{}", flow_line(flow));
        }
        eprintln!("{}", "─".repeat(50).dimmed());
    }
    eprintln!("{}", result_line(summary));
}
