//! Integration tests for `kbc graph`

use crate::helpers::{TestRepo, run_kbc};
use anyhow::Result;

#[test]
fn test_graph_text() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc(&repo.path, &["graph"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.starts_with("Dependency Graph:"));
  assert!(stdout.contains("base [BASE]"), "got: {}", stdout);
  assert!(stdout.contains("Used by:"));
  assert!(stdout.contains("- ../../base"));

  Ok(())
}

#[test]
fn test_graph_dot() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc(&repo.path, &["graph", "--format", "dot"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.starts_with("digraph"));
  assert!(stdout.contains("fillcolor=lightblue"));

  Ok(())
}

#[test]
fn test_graph_json() -> Result<()> {
  let repo = TestRepo::with_overlays()?;

  let output = run_kbc(&repo.path, &["graph", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  let nodes = json["nodes"].as_array().cloned().unwrap_or_default();
  assert_eq!(nodes.len(), 4);
  assert_eq!(json["edge_count"], 2);

  let base = nodes.iter().find(|n| n["path"] == "base").expect("base node");
  assert_eq!(base["is_base"], true);
  assert_eq!(base["used_by"], serde_json::json!(["overlays/dev", "overlays/prod"]));
  assert!(json["cycles"].as_array().is_some_and(|c| c.is_empty()));

  Ok(())
}

#[test]
fn test_graph_reports_cycles_and_skipped_files() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_kustomization("a", &["../b"])?;
  repo.add_kustomization("b", &["../a"])?;
  repo.write("broken/kustomization.yaml", "resources: [unclosed\n")?;
  repo.commit("Add cycle")?;

  let output = run_kbc(&repo.path, &["graph", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["cycles"], serde_json::json!([["a", "b"]]));
  assert_eq!(json["skipped"].as_array().map(|s| s.len()), Some(1));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Reference cycle"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_hidden_and_excluded_directories_are_skipped() -> Result<()> {
  let repo = TestRepo::with_overlays()?;
  repo.add_kustomization(".github/fixtures", &[])?;
  repo.add_kustomization("charts/app", &[])?;
  repo.write("kbc.toml", "exclude = [\"charts\"]\n")?;

  let output = run_kbc(&repo.path, &["graph", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let paths: Vec<_> = json["nodes"]
    .as_array()
    .into_iter()
    .flatten()
    .filter_map(|n| n["path"].as_str().map(String::from))
    .collect();

  assert_eq!(paths, vec!["apps/standalone", "base", "overlays/dev", "overlays/prod"]);

  Ok(())
}
