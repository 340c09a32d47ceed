//! System git backend
//!
//! Shells out to the `git` binary with an isolated environment. Only the
//! handful of commands change detection needs are wrapped here.

use crate::core::error::{GitError, KbcError, KbcResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Directory the repository was opened from
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  pub fn open(path: &Path) -> KbcResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(KbcError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(KbcError::message(format!(
        "Failed to open git repository: {}",
        stderr.trim()
      )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Working tree root; paths from `changed_files_between` are relative to it
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Files that differ between two refs (`git diff --name-only base head`)
  ///
  /// Paths are relative to the working tree, in git's order. Deleted files
  /// are included.
  pub fn changed_files_between(&self, base: &str, head: &str) -> KbcResult<Vec<PathBuf>> {
    let output = self
      .git_cmd()
      .args(["diff", "--name-only", base, head, "--"])
      .output()
      .context("Failed to execute git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(KbcError::Git(GitError::CommandFailed {
        command: format!("git diff --name-only {} {}", base, head),
        stderr: stderr.trim().to_string(),
      }));
    }

    let files = parse_name_only(&output.stdout);
    tracing::debug!(base, head, count = files.len(), "Collected changed files");
    Ok(files)
  }

  /// Create a git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("diff.renames=false");

    cmd
  }
}

/// One path per non-empty line
fn parse_name_only(stdout: &[u8]) -> Vec<PathBuf> {
  stdout
    .split(|&byte| byte == b'\n')
    .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    .filter(|line| !line.is_empty())
    .map(path_from_bytes)
    .collect()
}

/// Paths are raw bytes on unix; elsewhere git emits UTF-8.
#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
  use std::os::unix::ffi::OsStrExt;
  PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
  PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
