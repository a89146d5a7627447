//! Helpers shared by the integration tests: a throwaway git repository and
//! shell-script stand-ins for the flow2apex converter.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Whether a usable `git` is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Whether `diff` is GNU diffutils (supports `--expand-tabs`)
pub fn gnu_diff_available() -> bool {
    Command::new("diff")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).contains("GNU"))
}

/// A git repository in a temporary directory
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn init() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Self { dir };
        repo.git(&["init", "-q"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args([
                "-c",
                "user.name=flowdiff",
                "-c",
                "user.email=flowdiff@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(self.path())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path().join(relative)).unwrap();
    }

    /// Stage everything, commit and return the new commit id
    pub fn commit(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "--allow-empty", "-m", message]);
        self.git(&["rev-parse", "HEAD"])
    }

    /// Number of registered worktrees, the main one included
    pub fn worktree_count(&self) -> usize {
        self.git(&["worktree", "list", "--porcelain"])
            .lines()
            .filter(|line| line.starts_with("worktree "))
            .count()
    }
}

const RENDER_FN: &str = r#"flow="$1"
name=$(basename "$flow")
name=${name%%.*}
if grep -q BROKEN "$flow"; then
  echo "flow2apex: cannot convert $flow" >&2
  exit 1
fi
render() {
  echo "public class $name {"
  sed 's|^|    // |' "$flow"
  echo "}"
}
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{RENDER_FN}{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Converter that supports both `-d <dir>` and stdout output
pub fn converter_script(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "flow2apex",
        "if [ \"$2\" = \"-d\" ]; then\n  render > \"$3/$name.cls\"\nelse\n  render\nfi\n",
    )
}

/// Converter that rejects `-d` and only writes to stdout
pub fn stream_only_converter_script(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "flow2apex-stream",
        "if [ \"$2\" = \"-d\" ]; then\n  echo \"flow2apex: unknown flag -d\" >&2\n  exit 2\nfi\nrender\n",
    )
}
