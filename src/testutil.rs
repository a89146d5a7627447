//! Shared test utilities
//!
//! In-process fakes for the three tool seams. Only compiled in test builds.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::config::SideBySideLayout;
use crate::diff::DiffTool;
use crate::git::RevisionSource;
use crate::process::CommandOutput;
use crate::render::Converter;

/// Flow content that makes [`FakeConverter::succeeding`] fail both modes
pub const BROKEN_FLOW: &str = "<Flow>BROKEN</Flow>";

/// `RevisionSource` serving a fixed change list and per-revision files
#[derive(Debug, Default)]
pub struct FakeRevisionSource {
    paths: Option<Vec<String>>,
    files: Vec<(String, String, String)>,
    fail_materialize: bool,
    fail_release: bool,
    materialized: Mutex<Vec<String>>,
    released: Mutex<Vec<PathBuf>>,
}

impl FakeRevisionSource {
    /// Report `paths` as changed between any two revisions
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: Some(paths.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// A source whose change query always fails
    pub fn failing_query() -> Self {
        Self::default()
    }

    /// Write `content` at `path` whenever `revision` is materialized
    #[must_use]
    pub fn with_file(mut self, revision: &str, path: &str, content: &str) -> Self {
        self.files
            .push((revision.to_string(), path.to_string(), content.to_string()));
        self
    }

    /// Make every `materialize` call fail
    #[must_use]
    pub fn with_failing_materialize(mut self) -> Self {
        self.fail_materialize = true;
        self
    }

    /// Make every `release` call fail (after recording it)
    #[must_use]
    pub fn with_failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Revisions materialized so far
    pub fn materialized(&self) -> Vec<String> {
        self.materialized.lock().unwrap().clone()
    }

    /// Directories released so far
    pub fn released(&self) -> Vec<PathBuf> {
        self.released.lock().unwrap().clone()
    }
}

impl RevisionSource for FakeRevisionSource {
    async fn changed_paths(&self, _base: &str, _head: &str) -> Result<Vec<String>> {
        match &self.paths {
            Some(paths) => Ok(paths.clone()),
            None => bail!("fake change query failed"),
        }
    }

    async fn materialize(&self, revision: &str, dir: &Path) -> Result<()> {
        if self.fail_materialize {
            bail!("fake materialize failed for {revision}");
        }
        std::fs::create_dir_all(dir)?;
        for (rev, path, content) in &self.files {
            if rev == revision {
                let file = dir.join(path);
                if let Some(parent) = file.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(file, content)?;
            }
        }
        self.materialized.lock().unwrap().push(revision.to_string());
        Ok(())
    }

    fn release(&self, dir: &Path) -> Result<()> {
        self.released.lock().unwrap().push(dir.to_path_buf());
        if self.fail_release {
            bail!("fake release failed for {}", dir.display());
        }
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum ConverterMode {
    Succeeding,
    StreamOnly(String),
    Failing,
    Unlaunchable,
}

/// `Converter` that generates `<stem>.cls` from the flow content
#[derive(Debug)]
pub struct FakeConverter {
    mode: ConverterMode,
    available: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeConverter {
    fn with_mode(mode: ConverterMode) -> Self {
        Self {
            mode,
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Directory mode works unless the flow content is [`BROKEN_FLOW`]
    pub fn succeeding() -> Self {
        Self::with_mode(ConverterMode::Succeeding)
    }

    /// Directory mode fails; stream mode prints `text`
    pub fn stream_only(text: &str) -> Self {
        Self::with_mode(ConverterMode::StreamOnly(text.to_string()))
    }

    /// Both modes exit non-zero with distinct diagnostics
    pub fn failing() -> Self {
        Self::with_mode(ConverterMode::Failing)
    }

    /// Every invocation is a launch error
    pub fn unlaunchable() -> Self {
        Self::with_mode(ConverterMode::Unlaunchable)
    }

    /// Make `ensure_available` fail
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Modes invoked so far: `"dir"` or `"stdout"`
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn generated(flow_file: &Path) -> Result<Option<String>> {
        let content = std::fs::read_to_string(flow_file)?;
        if content == BROKEN_FLOW {
            return Ok(None);
        }
        Ok(Some(format!("// generated\n{content}\n")))
    }
}

impl Converter for FakeConverter {
    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            bail!("flow2apex binary not found on PATH")
        }
    }

    async fn render_to_dir(
        &self,
        _workdir: &Path,
        flow_file: &Path,
        output_dir: &Path,
    ) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push("dir");
        match &self.mode {
            ConverterMode::Succeeding => match Self::generated(flow_file)? {
                Some(apex) => {
                    let stem = flow_file
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    std::fs::write(output_dir.join(format!("{stem}.cls")), apex)?;
                    Ok(CommandOutput::new(Some(0), "", ""))
                }
                None => Ok(CommandOutput::new(Some(1), "", "invalid flow (dir)\n")),
            },
            ConverterMode::StreamOnly(_) => {
                Ok(CommandOutput::new(Some(2), "", "unknown flag -d\n"))
            }
            ConverterMode::Failing => Ok(CommandOutput::new(Some(1), "", "dir mode failed\n")),
            ConverterMode::Unlaunchable => bail!("Failed to spawn flow2apex"),
        }
    }

    async fn render_to_stdout(&self, _workdir: &Path, flow_file: &Path) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push("stdout");
        match &self.mode {
            ConverterMode::Succeeding => match Self::generated(flow_file)? {
                Some(apex) => Ok(CommandOutput::new(Some(0), apex, "")),
                None => Ok(CommandOutput::new(Some(1), "", "invalid flow (stdout)\n")),
            },
            ConverterMode::StreamOnly(text) => Ok(CommandOutput::new(Some(0), text.as_str(), "")),
            ConverterMode::Failing => Ok(CommandOutput::new(Some(1), "", "stdout mode failed\n")),
            ConverterMode::Unlaunchable => bail!("Failed to spawn flow2apex"),
        }
    }
}

type Reply = (i32, String, String);

/// `DiffTool` returning scripted replies, or comparing directories itself
#[derive(Debug, Default)]
pub struct FakeDiffTool {
    unified_reply: Option<(i32, String)>,
    side_by_side_replies: Mutex<VecDeque<Reply>>,
    reject_expand_tabs: bool,
    reject_all_options: bool,
    unlaunchable: bool,
    expand_tabs: Mutex<Vec<bool>>,
}

impl FakeDiffTool {
    /// Compare render directories file by file
    pub fn comparing() -> Self {
        Self::default()
    }

    /// Always answer unified requests with `exit_code` and `stdout`
    pub fn unified(exit_code: i32, stdout: &str) -> Self {
        Self {
            unified_reply: Some((exit_code, stdout.to_string())),
            ..Self::default()
        }
    }

    /// Answer side-by-side requests from `replies`, in order
    pub fn side_by_side(replies: Vec<Reply>) -> Self {
        Self {
            side_by_side_replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Every invocation is a launch error
    pub fn unlaunchable() -> Self {
        Self {
            unlaunchable: true,
            ..Self::default()
        }
    }

    /// Reject `--expand-tabs` like a BSD diff
    #[must_use]
    pub fn rejecting_expand_tabs(mut self) -> Self {
        self.reject_expand_tabs = true;
        self
    }

    /// Reject every side-by-side option set
    #[must_use]
    pub fn rejecting_all_options(mut self) -> Self {
        self.reject_all_options = true;
        self
    }

    /// `expand_tabs` value of every side-by-side request so far
    pub fn expand_tabs_requests(&self) -> Vec<bool> {
        self.expand_tabs.lock().unwrap().clone()
    }
}

fn read_tree(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        files.insert(name, std::fs::read_to_string(entry.path())?);
    }
    Ok(files)
}

/// File names present on either side, with their contents
fn changed_files(base_dir: &Path, head_dir: &Path) -> Result<Vec<(String, String, String)>> {
    let base = read_tree(base_dir)?;
    let head = read_tree(head_dir)?;
    let mut names: Vec<&String> = base.keys().chain(head.keys()).collect();
    names.sort();
    names.dedup();
    Ok(names
        .into_iter()
        .filter_map(|name| {
            let old = base.get(name).cloned().unwrap_or_default();
            let new = head.get(name).cloned().unwrap_or_default();
            (old != new).then(|| (name.clone(), old, new))
        })
        .collect())
}

impl DiffTool for FakeDiffTool {
    async fn unified(
        &self,
        _workdir: &Path,
        flow_path: &str,
        base_dir: &Path,
        head_dir: &Path,
    ) -> Result<CommandOutput> {
        if self.unlaunchable {
            bail!("Failed to spawn git");
        }
        if let Some((code, stdout)) = &self.unified_reply {
            return Ok(CommandOutput::new(Some(*code), stdout.as_str(), ""));
        }

        let changed = changed_files(base_dir, head_dir)?;
        if changed.is_empty() {
            return Ok(CommandOutput::new(Some(0), "", ""));
        }
        let mut text = String::new();
        for (name, old, new) in changed {
            text.push_str(&format!("--- a/{flow_path}/{name}\n+++ b/{flow_path}/{name}\n"));
            for line in old.lines() {
                text.push_str(&format!("-{line}\n"));
            }
            for line in new.lines() {
                text.push_str(&format!("+{line}\n"));
            }
        }
        Ok(CommandOutput::new(Some(1), text, ""))
    }

    async fn side_by_side(
        &self,
        _workdir: &Path,
        base_dir: &Path,
        head_dir: &Path,
        layout: &SideBySideLayout,
        expand_tabs: bool,
    ) -> Result<CommandOutput> {
        if self.unlaunchable {
            bail!("Failed to spawn diff");
        }
        self.expand_tabs.lock().unwrap().push(expand_tabs);
        if self.reject_all_options || (self.reject_expand_tabs && expand_tabs) {
            return Ok(CommandOutput::new(
                Some(2),
                "",
                "diff: unrecognized option '--expand-tabs'\n",
            ));
        }
        if let Some((code, stdout, stderr)) = self.side_by_side_replies.lock().unwrap().pop_front() {
            return Ok(CommandOutput::new(Some(code), stdout, stderr));
        }

        let changed = changed_files(base_dir, head_dir)?;
        if changed.is_empty() {
            return Ok(CommandOutput::new(Some(0), "", ""));
        }
        let column = layout.marker_column();
        let mut text = String::new();
        for (name, old, new) in changed {
            text.push_str(&format!(
                "diff --recursive --side-by-side {}/{name} {}/{name}\n",
                base_dir.display(),
                head_dir.display()
            ));
            let old: Vec<&str> = old.lines().collect();
            let new: Vec<&str> = new.lines().collect();
            for idx in 0..old.len().max(new.len()) {
                let line = match (old.get(idx), new.get(idx)) {
                    (Some(l), Some(r)) if l == r => format!("{l:<width$}", width = column + 2) + l,
                    (Some(l), Some(r)) => format!("{l:<column$}| {r}"),
                    (Some(l), None) => format!("{l:<column$}<"),
                    (None, Some(r)) => format!("{:<column$}> {r}", ""),
                    (None, None) => String::new(),
                };
                text.push_str(&line);
                text.push('\n');
            }
        }
        Ok(CommandOutput::new(Some(1), text, ""))
    }
}
