//! `kbc build` - Run `kustomize build` for affected kustomizations
//!
//! Supports:
//! - `--base`/`--head` to pick the git range
//! - `--files` to skip git and name changed files directly
//! - `--all` to build every discovered kustomization
//! - `--dry-run` to show the plan without executing

use super::affected::{ChangeSource, analyze_changes, build_targets};
use crate::build::{BuildResult, KustomizeBuilder};
use crate::core::context::RunContext;
use crate::core::error::{KbcError, KbcResult};
use crate::report::{self, JsonReport, Summary};
use std::path::PathBuf;

/// Output format for build command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
  Text,
  Json,
}

impl OutputFormat {
  fn from_str(s: &str) -> KbcResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      _ => Err(KbcError::message(format!("Unknown format '{}'. Valid formats: text, json", s))),
    }
  }
}

/// Run the build command
pub fn run_build(ctx: &RunContext, source: ChangeSource, all: bool, dry_run: bool, format: String) -> KbcResult<()> {
  let output_format = OutputFormat::from_str(&format)?;

  let targets = if all {
    ctx
      .units
      .iter()
      .map(|unit| PathBuf::from(ctx.display_path(&unit.directory)))
      .collect()
  } else {
    let analysis = analyze_changes(ctx, source)?;
    build_targets(ctx, &analysis)
  };

  let builder = KustomizeBuilder::from_config(&ctx.config)
    .with_work_dir(ctx.root())
    .with_progress(output_format == OutputFormat::Text);

  if dry_run {
    println!("DRY RUN: Would execute:");
    for target in &targets {
      println!("  {}", builder.command_line(target));
    }
    return Ok(());
  }

  let results = execute_builds(&builder, &targets);

  match output_format {
    OutputFormat::Text => report::print_results(&mut std::io::stdout().lock(), &results)?,
    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&JsonReport::new(&results))?),
  }

  ensure_passed(ctx, &results)
}

/// Build `targets` in order, logging the plan first
pub fn execute_builds(builder: &KustomizeBuilder, targets: &[PathBuf]) -> Vec<BuildResult> {
  if targets.is_empty() {
    return Vec::new();
  }
  tracing::info!(count = targets.len(), "Running kustomize build");
  for target in targets {
    tracing::debug!(path = %target.display(), "Queued kustomization");
  }
  builder.build_all(targets)
}

/// Turn failed builds into an error when `fail_on_error` is set
pub fn ensure_passed(ctx: &RunContext, results: &[BuildResult]) -> KbcResult<()> {
  let summary = Summary::from_results(results);
  if summary.all_passed() {
    return Ok(());
  }

  if !ctx.config.fail_on_error {
    tracing::warn!(failed = summary.failed, "Builds failed, but fail_on_error is off");
    return Ok(());
  }

  Err(KbcError::with_help(
    format!("{} of {} kustomize build(s) failed", summary.failed, summary.total),
    format!(
      "Reproduce locally with `{} build <dir>` from {}",
      ctx.config.kustomize_bin,
      ctx.root().display()
    ),
  ))
}
