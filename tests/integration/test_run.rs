//! Integration tests for `kbc run` (GitHub Action mode)

use crate::helpers::{FakeKustomize, TestRepo, git, kbc_command};
use anyhow::Result;
use std::fs;
use tempfile::TempDir;

struct ActionEnv {
  _dir: TempDir,
  output: std::path::PathBuf,
  summary: std::path::PathBuf,
}

impl ActionEnv {
  fn new() -> Result<Self> {
    let dir = TempDir::new()?;
    let output = dir.path().join("github_output");
    let summary = dir.path().join("step_summary.md");
    Ok(Self {
      _dir: dir,
      output,
      summary,
    })
  }
}

#[test]
fn test_run_writes_github_outputs() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  let env = ActionEnv::new()?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = kbc_command(&repo.path, &["run", "--kustomize", &kustomize.arg()])
    .env("GITHUB_OUTPUT", &env.output)
    .env("GITHUB_STEP_SUMMARY", &env.summary)
    .env("INPUT_ENABLE-HELM", "false")
    .output()?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("3 kustomization(s) need testing"), "got: {}", stdout);
  assert!(stdout.contains("All checks passed"));

  let outputs = fs::read_to_string(&env.output)?;
  assert!(outputs.contains("failed-count=0\n"));
  assert!(outputs.contains("success-count=3\n"));
  let results_line = outputs
    .lines()
    .find_map(|line| line.strip_prefix("results="))
    .expect("results output");
  let results: serde_json::Value = serde_json::from_str(results_line)?;
  assert_eq!(results[0]["output"], "# build base\n");

  let summary = fs::read_to_string(&env.summary)?;
  assert!(summary.contains("| Total Builds | 3 |"));
  assert!(summary.contains("Click to see passed builds"));

  Ok(())
}

#[test]
fn test_run_reports_failures() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  let env = ActionEnv::new()?;
  repo.write("overlays/prod/FAIL", "")?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = kbc_command(&repo.path, &["run", "--kustomize", &kustomize.arg()])
    .env("GITHUB_OUTPUT", &env.output)
    .env("GITHUB_STEP_SUMMARY", &env.summary)
    .output()?;
  assert_eq!(output.status.code(), Some(1));

  let outputs = fs::read_to_string(&env.output)?;
  assert!(outputs.contains("failed-count=1\n"));
  assert!(outputs.contains("success-count=2\n"));

  let summary = fs::read_to_string(&env.summary)?;
  assert!(summary.contains("### ❌ Build Errors"));
  assert!(summary.contains("- **overlays/prod**"));

  Ok(())
}

#[test]
fn test_run_fail_on_error_input() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  repo.write("overlays/prod/FAIL", "")?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = kbc_command(&repo.path, &["run", "--kustomize", &kustomize.arg()])
    .env("INPUT_FAIL-ON-ERROR", "false")
    .output()?;
  assert!(output.status.success());

  Ok(())
}

#[test]
fn test_run_without_affected_kustomizations() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let env = ActionEnv::new()?;
  git(&repo.path, &["branch", "start"])?;
  repo.change("README.md", "# changed\n")?;

  let output = kbc_command(&repo.path, &["run"])
    .env("GITHUB_OUTPUT", &env.output)
    .env("GITHUB_STEP_SUMMARY", &env.summary)
    .env("INPUT_BASE-REF", "start")
    .output()?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  assert!(String::from_utf8_lossy(&output.stdout).contains("No kustomizations affected by changes"));

  let outputs = fs::read_to_string(&env.output)?;
  assert!(outputs.contains("failed-count=0\nsuccess-count=0\nresults=[]\n"));

  Ok(())
}
