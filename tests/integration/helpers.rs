//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Variables that would leak the caller's environment into kbc
const SCRUBBED_ENV: &[&str] = &[
  "GITHUB_OUTPUT",
  "GITHUB_STEP_SUMMARY",
  "INPUT_BASE-REF",
  "INPUT_ENABLE-HELM",
  "INPUT_FAIL-ON-ERROR",
  "INPUT_ROOT-DIR",
  "LOG_LEVEL",
  "RUST_LOG",
];

/// A git repository holding kustomizations
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Create an empty repository with one initial commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().canonicalize()?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(path.join("README.md"), "# clusters\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Repository with a base, two overlays on it and an unrelated app:
  ///
  /// ```text
  /// base/              resources: deployment.yaml
  /// overlays/dev/      resources: ../../base
  /// overlays/prod/     resources: ../../base, patchesStrategicMerge: patch.yaml
  /// apps/standalone/   resources: configmap.yaml
  /// ```
  pub fn with_overlays() -> Result<Self> {
    let repo = Self::new()?;
    repo.add_kustomization("base", &["deployment.yaml"])?;
    repo.write("base/deployment.yaml", "kind: Deployment\n")?;
    repo.add_kustomization("overlays/dev", &["../../base"])?;
    repo.write(
      "overlays/prod/kustomization.yaml",
      "resources:\n- ../../base\npatchesStrategicMerge:\n- patch.yaml\n",
    )?;
    repo.write("overlays/prod/patch.yaml", "kind: Deployment\n")?;
    repo.add_kustomization("apps/standalone", &["configmap.yaml"])?;
    repo.write("apps/standalone/configmap.yaml", "kind: ConfigMap\n")?;
    repo.commit("Add kustomizations")?;
    Ok(repo)
  }

  /// Write a kustomization.yaml listing `resources`
  pub fn add_kustomization(&self, dir: &str, resources: &[&str]) -> Result<PathBuf> {
    let mut content = String::from("apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\n");
    if resources.is_empty() {
      content.push_str("resources: []\n");
    } else {
      content.push_str("resources:\n");
      for resource in resources {
        content.push_str(&format!("- {}\n", resource));
      }
    }
    self.write(&format!("{}/kustomization.yaml", dir), &content)?;
    Ok(self.path.join(dir))
  }

  /// Write a file, creating parent directories
  pub fn write(&self, rel: &str, content: &str) -> Result<()> {
    let file = self.path.join(rel);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "-A"])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Change a file and commit it
  pub fn change(&self, rel: &str, content: &str) -> Result<String> {
    self.write(rel, content)?;
    self.commit(&format!("Change {}", rel))
  }
}

/// Stand-in for kustomize: echoes its arguments, fails for directories
/// containing a FAIL marker file
#[cfg(unix)]
pub struct FakeKustomize {
  _dir: TempDir,
  pub path: PathBuf,
}

#[cfg(unix)]
impl FakeKustomize {
  pub fn new() -> Result<Self> {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new()?;
    let path = dir.path().join("kustomize");
    std::fs::write(
      &path,
      r##"#!/bin/sh
for target; do :; done
if [ -f "$target/FAIL" ]; then
  echo "Error: accumulating resources from '$target'" >&2
  exit 1
fi
echo "# $*"
"##,
    )?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(Self { _dir: dir, path })
  }

  pub fn arg(&self) -> String {
    self.path.display().to_string()
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// kbc command with a clean environment, not yet run
pub fn kbc_command(cwd: &Path, args: &[&str]) -> Command {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_kbc"));
  cmd.current_dir(cwd).args(args);
  for key in SCRUBBED_ENV {
    cmd.env_remove(key);
  }
  cmd
}

/// Run kbc and require success
pub fn run_kbc(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = kbc_command(cwd, args).output().context("Failed to run kbc")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "kbc command failed: kbc {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run kbc and return the output whatever the exit status
pub fn run_kbc_unchecked(cwd: &Path, args: &[&str]) -> Result<Output> {
  kbc_command(cwd, args).output().context("Failed to run kbc")
}

/// Non-empty stdout lines
pub fn stdout_lines(output: &Output) -> Vec<String> {
  String::from_utf8_lossy(&output.stdout)
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(String::from)
    .collect()
}
