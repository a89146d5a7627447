//! Isolated revision snapshots
//!
//! A [`Snapshot`] owns one detached working copy for the duration of a run
//! and removes it when dropped, whichever way the run ends.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::RevisionSource;

/// Detached working copy of one revision
pub struct Snapshot<'a, S: RevisionSource> {
    source: &'a S,
    root: PathBuf,
    revision: String,
}

impl<'a, S: RevisionSource> Snapshot<'a, S> {
    /// Materialize `revision` at `root`.
    ///
    /// On error nothing is left for the caller to release.
    pub async fn create(source: &'a S, revision: &str, root: PathBuf) -> Result<Self> {
        source.materialize(revision, &root).await?;
        tracing::debug!(revision, root = %root.display(), "materialized snapshot");
        Ok(Self {
            source,
            root,
            revision: revision.to_string(),
        })
    }

    /// Root of the working copy
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Revision this snapshot materializes
    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Absolute path of a repository-relative file inside the snapshot
    #[must_use]
    pub fn path_of(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl<S: RevisionSource> Drop for Snapshot<'_, S> {
    fn drop(&mut self) {
        match self.source.release(&self.root) {
            Ok(()) => tracing::debug!(root = %self.root.display(), "released snapshot"),
            Err(err) => tracing::warn!("{err:#}"),
        }
    }
}

impl<S: RevisionSource> std::fmt::Debug for Snapshot<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("root", &self.root)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
