//! Integration tests for `kbc affected`

use crate::helpers::{TestRepo, git, run_kbc, run_kbc_unchecked, stdout_lines};
use anyhow::Result;

#[test]
fn test_base_change_affects_overlays() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  let output = run_kbc(&repo.path, &["affected", "--format", "names-only"])?;
  assert_eq!(stdout_lines(&output), vec!["base", "overlays/dev", "overlays/prod"]);

  Ok(())
}

#[test]
fn test_patch_change_affects_only_its_overlay() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("overlays/prod/patch.yaml", "kind: Deployment\nspec:\n  replicas: 3\n")?;

  let output = run_kbc(&repo.path, &["affected", "--format", "names"])?;
  assert_eq!(stdout_lines(&output), vec!["overlays/prod"]);

  Ok(())
}

#[test]
fn test_unrelated_change_affects_nothing() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("README.md", "# clusters\n\nUpdated.\n")?;

  let output = run_kbc(&repo.path, &["affected"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Changed files: 1"), "got: {}", stdout);
  assert!(stdout.contains("Build targets (direct + dependents): 0"), "got: {}", stdout);

  Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  git(&repo.path, &["branch", "baseline"])?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;
  repo.change("apps/standalone/configmap.yaml", "kind: ConfigMap\ndata: {}\n")?;

  let output = run_kbc(&repo.path, &["affected", "--base", "baseline", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(json["changed_files"].as_array().map(|a| a.len()), Some(2));
  assert_eq!(json["impact"]["direct"], serde_json::json!(["apps/standalone", "base"]));
  assert_eq!(json["impact"]["dependents"], serde_json::json!(["overlays/dev", "overlays/prod"]));
  assert_eq!(json["summary"]["targets_count"], 4);

  Ok(())
}

#[test]
fn test_kustomization_edit_affects_dependents() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.add_kustomization("base", &["deployment.yaml", "service.yaml"])?;
  repo.write("base/service.yaml", "kind: Service\n")?;
  repo.commit("Add service")?;

  let output = run_kbc(&repo.path, &["affected", "--format", "names-only"])?;
  assert_eq!(stdout_lines(&output), vec!["base", "overlays/dev", "overlays/prod"]);

  Ok(())
}

#[test]
fn test_explicit_files_skip_git() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc(
    &repo.path,
    &["affected", "--files", "apps/standalone/configmap.yaml", "--format", "names-only"],
  )?;
  assert_eq!(stdout_lines(&output), vec!["apps/standalone"]);

  Ok(())
}

#[test]
fn test_root_dir_limits_discovery() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("base/deployment.yaml", "kind: Deployment\nspec: {}\n")?;

  // base is outside the scanned root, but both overlays still point into it
  let output = run_kbc(
    &repo.path,
    &["affected", "--root-dir", "overlays", "--format", "names-only"],
  )?;
  assert_eq!(stdout_lines(&output), vec!["dev", "prod"]);

  Ok(())
}

#[test]
fn test_root_dir_limits_discovery_base_manifest_change() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.change("base/kustomization.yaml", "resources:\n- deployment.yaml\nnamePrefix: v2-\n")?;

  // the only changed file is the kustomization of a base outside the root
  let output = run_kbc(
    &repo.path,
    &["affected", "--root-dir", "overlays", "--format", "names-only"],
  )?;
  assert_eq!(stdout_lines(&output), vec!["dev", "prod"]);

  Ok(())
}

#[test]
fn test_deleted_base_manifest_rebuilds_overlays() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  std::fs::remove_file(repo.path.join("base/kustomization.yaml"))?;
  repo.commit("Remove base kustomization")?;

  let output = run_kbc(&repo.path, &["affected", "--format", "names-only"])?;
  assert_eq!(stdout_lines(&output), vec!["overlays/dev", "overlays/prod"]);

  Ok(())
}

#[test]
fn test_unknown_base_ref_fails() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc_unchecked(&repo.path, &["affected", "--base", "does-not-exist"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("git diff"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_unknown_format_fails() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc_unchecked(&repo.path, &["affected", "--format", "yaml"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown format"));

  Ok(())
}
