//! `kbc run` - GitHub Action entry point
//!
//! Detect changes, build what they affect, report to the console and to the
//! Actions environment (`GITHUB_OUTPUT`, `GITHUB_STEP_SUMMARY`). Action
//! inputs arrive as `INPUT_*` variables and are already folded into the
//! config by the time this runs.

use super::affected::{ChangeSource, analyze_changes, build_targets};
use super::build::{ensure_passed, execute_builds};
use crate::build::KustomizeBuilder;
use crate::core::context::RunContext;
use crate::core::error::KbcResult;
use crate::report;

/// Run the action
pub fn run_action(ctx: &RunContext) -> KbcResult<()> {
  println!("🔍 Kustomize Build Check");
  println!();
  tracing::info!(
    root = %ctx.root().display(),
    base = %ctx.config.base_ref,
    enable_helm = ctx.config.enable_helm,
    fail_on_error = ctx.config.fail_on_error,
    "Starting build check"
  );

  let analysis = analyze_changes(ctx, ChangeSource::Git)?;
  let targets = build_targets(ctx, &analysis);

  if targets.is_empty() {
    println!("   No kustomizations affected by changes");
  } else {
    println!("   {} kustomization(s) need testing:", targets.len());
    for target in &targets {
      println!("     - {}", target.display());
    }
  }

  let builder = KustomizeBuilder::from_config(&ctx.config).with_work_dir(ctx.root());
  let results = execute_builds(&builder, &targets);

  if !results.is_empty() {
    report::print_results(&mut std::io::stdout().lock(), &results)?;
  }

  // Reporting to Actions never decides the outcome
  if let Err(err) = report::publish_github(&results) {
    tracing::warn!(error = %err, "Failed to write GitHub Actions outputs");
  }

  ensure_passed(ctx, &results)?;
  println!("\n✅ All checks passed");
  Ok(())
}
