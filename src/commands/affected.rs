//! `kbc affected` - Show which kustomizations are affected by changes
//!
//! This command analyzes file changes (via git) and determines:
//! - Which kustomizations directly own changed files
//! - Which kustomizations transitively build on those
//! - The set of kustomizations that need `kustomize build`

use crate::core::context::RunContext;
use crate::core::error::{KbcError, KbcResult};
use crate::core::vcs::SystemGit;
use crate::graph::{AffectedAnalysis, ImpactAnalyzer, TracingObserver};
use std::path::PathBuf;
use std::sync::Arc;

/// Output format for affected command
#[derive(Debug, Clone, Copy)]
enum OutputFormat {
  Text,
  Json,
  NamesOnly,
}

impl OutputFormat {
  fn from_str(s: &str) -> KbcResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::NamesOnly),
      _ => Err(KbcError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names-only",
        s
      ))),
    }
  }
}

/// Where the changed files come from
pub enum ChangeSource {
  /// `git diff --name-only base head`
  Git,
  /// Explicit list, relative to the current directory
  Files(Vec<PathBuf>),
}

/// Run the affected command
pub fn run_affected(ctx: &RunContext, source: ChangeSource, format: String) -> KbcResult<()> {
  let output_format = OutputFormat::from_str(&format)?;
  let analysis = analyze_changes(ctx, source)?;
  display_results(ctx, &analysis, output_format)
}

/// Collect changed files and map them to affected kustomizations
pub fn analyze_changes(ctx: &RunContext, source: ChangeSource) -> KbcResult<AffectedAnalysis> {
  let (changed_files, anchor) = match source {
    ChangeSource::Git => {
      let (base, head) = (&ctx.config.base_ref, &ctx.config.head_ref);
      tracing::info!(base = %base, head = %head, "Detecting changed files");

      let git = SystemGit::open(ctx.root())?;
      let files = git.changed_files_between(base, head)?;
      (files, git.work_tree().to_path_buf())
    }
    ChangeSource::Files(files) => (files, ctx.work_dir.clone()),
  };
  tracing::info!(count = changed_files.len(), "Found changed files");

  let analyzer = ImpactAnalyzer::new()
    .with_root(anchor)
    .with_observer(Arc::new(TracingObserver));
  let analysis = analyzer.analyze(&changed_files, &ctx.graph, &ctx.units);
  tracing::info!(count = analysis.impact.len(), "Kustomizations to test");

  Ok(analysis)
}

/// Affected kustomizations as build paths relative to the root, sorted
pub fn build_targets(ctx: &RunContext, analysis: &AffectedAnalysis) -> Vec<PathBuf> {
  relative(ctx, &analysis.impact.sorted_targets())
}

fn relative(ctx: &RunContext, dirs: &[PathBuf]) -> Vec<PathBuf> {
  dirs.iter().map(|dir| PathBuf::from(ctx.display_path(dir))).collect()
}

/// Display affected analysis results
fn display_results(ctx: &RunContext, analysis: &AffectedAnalysis, format: OutputFormat) -> KbcResult<()> {
  match format {
    OutputFormat::Text => display_text(ctx, analysis),
    OutputFormat::Json => display_json(ctx, analysis),
    OutputFormat::NamesOnly => display_names_only(ctx, analysis),
  }
}

/// Display results in human-readable text format
fn display_text(ctx: &RunContext, analysis: &AffectedAnalysis) -> KbcResult<()> {
  println!("Affected Analysis");
  println!("=================");
  println!();

  println!("Changed files: {}", analysis.changed_files.len());
  if !analysis.changed_files.is_empty() && analysis.changed_files.len() <= 20 {
    for file in &analysis.changed_files {
      println!("  {}", ctx.display_path(file));
    }
    println!();
  }

  let direct = relative(ctx, &analysis.impact.sorted_direct());
  let dependents = relative(ctx, &analysis.impact.sorted_dependents());
  let targets = build_targets(ctx, analysis);

  println!("Direct impact: {} kustomizations", direct.len());
  for dir in &direct {
    println!("  📦 {}", dir.display());
  }
  println!();

  println!("Transitive dependents: {} kustomizations", dependents.len());
  for dir in &dependents {
    println!("  ⬆  {}", dir.display());
  }
  println!();

  println!("Build targets (direct + dependents): {} kustomizations", targets.len());
  for dir in &targets {
    println!("  🎯 {}", dir.display());
  }

  Ok(())
}

/// Display results in JSON format
fn display_json(ctx: &RunContext, analysis: &AffectedAnalysis) -> KbcResult<()> {
  use serde_json::json;

  let changed: Vec<_> = analysis.changed_files.iter().map(|f| ctx.display_path(f)).collect();
  let direct = relative(ctx, &analysis.impact.sorted_direct());
  let dependents = relative(ctx, &analysis.impact.sorted_dependents());
  let targets = build_targets(ctx, analysis);

  let output = json!({
      "root": ctx.root(),
      "changed_files": changed,
      "impact": {
          "direct": direct,
          "dependents": dependents,
          "targets": targets
      },
      "summary": {
          "changed_files_count": changed.len(),
          "direct_count": direct.len(),
          "dependents_count": dependents.len(),
          "targets_count": targets.len()
      }
  });

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

/// Display only build targets, one per line
fn display_names_only(ctx: &RunContext, analysis: &AffectedAnalysis) -> KbcResult<()> {
  for dir in build_targets(ctx, analysis) {
    println!("{}", dir.display());
  }

  Ok(())
}
