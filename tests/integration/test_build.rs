//! Integration tests for `kbc build`

use crate::helpers::{FakeKustomize, TestRepo, run_kbc, run_kbc_unchecked, stdout_lines};
use anyhow::Result;

#[test]
fn test_dry_run_lists_commands() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = run_kbc(&repo.path, &["build", "--dry-run"])?;
  assert_eq!(
    stdout_lines(&output),
    vec![
      "DRY RUN: Would execute:",
      "  kustomize build --enable-helm base",
      "  kustomize build --enable-helm overlays/dev",
      "  kustomize build --enable-helm overlays/prod",
    ]
  );

  Ok(())
}

#[test]
fn test_dry_run_all_without_helm() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc(&repo.path, &["build", "--all", "--dry-run", "--enable-helm", "false"])?;
  let lines = stdout_lines(&output);
  assert_eq!(lines.len(), 5);
  assert_eq!(lines[1], "  kustomize build apps/standalone");

  Ok(())
}

#[test]
fn test_builds_affected_kustomizations() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = run_kbc(&repo.path, &["build", "--kustomize", &kustomize.arg()])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("✅ base - Build successful"), "got: {}", stdout);
  assert!(stdout.contains("✅ overlays/prod - Build successful"));
  assert!(!stdout.contains("apps/standalone"));
  assert!(stdout.contains("Summary: 3 total, 3 successful, 0 failed"));

  Ok(())
}

#[test]
fn test_failed_build_exits_non_zero() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  repo.write("overlays/dev/FAIL", "")?;

  let output = run_kbc_unchecked(&repo.path, &["build", "--all", "--kustomize", &kustomize.arg()])?;
  assert_eq!(output.status.code(), Some(1));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("❌ overlays/dev - Build failed"), "got: {}", stdout);
  assert!(stdout.contains("Error: accumulating resources from 'overlays/dev'"));
  assert!(stdout.contains("Summary: 4 total, 3 successful, 1 failed"));
  assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 4 kustomize build(s) failed"));

  Ok(())
}

#[test]
fn test_fail_on_error_false_passes() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  repo.write("overlays/dev/FAIL", "")?;

  let output = run_kbc(
    &repo.path,
    &["build", "--all", "--kustomize", &kustomize.arg(), "--fail-on-error", "false"],
  )?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("1 failed"));

  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  repo.change("overlays/prod/patch.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = run_kbc(
    &repo.path,
    &["build", "--format", "json", "--kustomize", &kustomize.arg(), "--enable-helm", "false"],
  )?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(json["summary"]["total"], 1);
  assert_eq!(json["results"][0]["path"], "overlays/prod");
  assert_eq!(json["results"][0]["success"], true);
  assert_eq!(json["results"][0]["output"], "# build overlays/prod\n");

  Ok(())
}

#[test]
fn test_config_file_sets_kustomize() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  let kustomize = FakeKustomize::new()?;
  repo.write(
    ".kbc.toml",
    &format!("kustomize_bin = \"{}\"\nenable_helm = false\n", kustomize.arg()),
  )?;
  repo.change("apps/standalone/configmap.yaml", "kind: ConfigMap\ndata: {}\n")?;

  let output = run_kbc(&repo.path, &["build"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("✅ apps/standalone - Build successful"), "got: {}", stdout);
  assert!(stdout.contains("Summary: 1 total"));

  Ok(())
}

#[test]
fn test_nothing_to_build() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("README.md", "# changed\n")?;

  let output = run_kbc(&repo.path, &["build", "--kustomize", "kbc-missing-kustomize"])?;
  assert_eq!(stdout_lines(&output), vec!["✓ No kustomizations need testing"]);

  Ok(())
}
