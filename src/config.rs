//! Run configuration
//!
//! Parses the optional `flowdiff.toml` into the structure that the pipeline
//! receives explicitly. Every field has a default, so an empty file (or no
//! file at all) yields the stock layout and limits.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// How rendered outputs are compared and presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffFormat {
    /// `git diff --no-index` unified output
    #[default]
    Unified,
    /// Fixed-width two-column output from the `diff` tool
    SideBySide,
}

impl DiffFormat {
    /// The selector string accepted on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::SideBySide => "side-by-side",
        }
    }
}

impl fmt::Display for DiffFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiffFormat {
    type Err = anyhow::Error;

    /// Case-insensitive; an empty selector means unified.
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "unified" => Ok(Self::Unified),
            "side-by-side" => Ok(Self::SideBySide),
            _ => bail!(
                "invalid diff-format {value:?} (expected {:?} or {:?})",
                Self::Unified.as_str(),
                Self::SideBySide.as_str()
            ),
        }
    }
}

/// Display geometry shared by the diff invocation and the marker parser
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SideBySideLayout {
    /// Total output width passed as `--width`
    #[serde(default = "default_width")]
    pub width: usize,
    /// Tab stop passed as `--tabsize`
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,
}

const fn default_width() -> usize {
    200
}

const fn default_tab_size() -> usize {
    3
}

impl Default for SideBySideLayout {
    fn default() -> Self {
        Self {
            width: default_width(),
            tab_size: default_tab_size(),
        }
    }
}

impl SideBySideLayout {
    /// Byte column of the separator marker for this width.
    #[must_use]
    pub const fn marker_column(&self) -> usize {
        (self.width / 2).saturating_sub(1)
    }
}

/// Size caps applied while assembling the report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportLimits {
    /// Cap for a single flow's diff block
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,
    /// Cap for each converter log
    #[serde(default = "default_max_log_chars")]
    pub max_log_chars: usize,
    /// Cap for the whole Markdown comment
    #[serde(default = "default_max_comment_chars")]
    pub max_comment_chars: usize,
}

const fn default_max_diff_chars() -> usize {
    12_000
}

const fn default_max_log_chars() -> usize {
    4_000
}

const fn default_max_comment_chars() -> usize {
    60_000
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_diff_chars: default_max_diff_chars(),
            max_log_chars: default_max_log_chars(),
            max_comment_chars: default_max_comment_chars(),
        }
    }
}

/// External tool names and the per-invocation deadline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    /// Version-control executable
    #[serde(default = "default_git")]
    pub git: String,
    /// Text-diff executable used for side-by-side output
    #[serde(default = "default_diff")]
    pub diff: String,
    /// Deadline for each external invocation in seconds (0 disables it)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_git() -> String {
    "git".to_string()
}

fn default_diff() -> String {
    "diff".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            diff: default_diff(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolConfig {
    /// The deadline as a `Duration`, or `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// Top-level configuration parsed from `flowdiff.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    /// Side-by-side geometry
    #[serde(default)]
    pub side_by_side: SideBySideLayout,
    /// Report size caps
    #[serde(default)]
    pub limits: ReportLimits,
    /// External tools
    #[serde(default)]
    pub tools: ToolConfig,
}

impl RunConfig {
    /// Parse a configuration file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parse configuration content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse flowdiff.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.side_by_side.width < 4 {
            bail!(
                "side_by_side.width must be at least 4, got {}",
                self.side_by_side.width
            );
        }
        if self.side_by_side.tab_size == 0 {
            bail!("side_by_side.tab_size must be at least 1");
        }

        let limits = [
            ("limits.max_diff_chars", self.limits.max_diff_chars),
            ("limits.max_log_chars", self.limits.max_log_chars),
            ("limits.max_comment_chars", self.limits.max_comment_chars),
        ];
        for (name, value) in limits {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }

        if self.tools.git.trim().is_empty() {
            bail!("tools.git cannot be empty");
        }
        if self.tools.diff.trim().is_empty() {
            bail!("tools.diff cannot be empty");
        }

        Ok(())
    }
}
