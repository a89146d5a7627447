//! Flow change detection
//!
//! Narrows the revision diff to flow definition files and puts them in a
//! deterministic order.

use anyhow::{bail, Result};

use super::RevisionSource;

const FLOW_SUFFIXES: [&str; 2] = [".flow", ".flow-meta.xml"];

/// Whether `path` names a flow definition (`*.flow` or `*.flow-meta.xml`).
#[must_use]
pub fn is_flow_path(path: &str) -> bool {
    FLOW_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Trim, filter to flow definitions, sort and deduplicate.
#[must_use]
pub fn filter_flow_paths<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flows: Vec<String> = paths
        .into_iter()
        .filter_map(|path| {
            let trimmed = path.as_ref().trim();
            (!trimmed.is_empty() && is_flow_path(trimmed)).then(|| trimmed.to_string())
        })
        .collect();
    flows.sort();
    flows.dedup();
    flows
}

/// List the flow files changed between `base` and `head`.
///
/// Empty revision ids are rejected. Failure of the underlying query is
/// returned as-is; it is never retried.
pub async fn detect_changed_flows<S: RevisionSource>(
    source: &S,
    base: &str,
    head: &str,
) -> Result<Vec<String>> {
    if base.trim().is_empty() || head.trim().is_empty() {
        bail!("base-sha and head-sha are required");
    }
    let paths = source.changed_paths(base, head).await?;
    let flows = filter_flow_paths(&paths);
    tracing::info!(
        changed = paths.len(),
        flows = flows.len(),
        "detected changed flow files"
    );
    Ok(flows)
}
