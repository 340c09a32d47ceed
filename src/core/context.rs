//! Run context - discover and build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   RunContext::build() -> &RunContext
//!   |
//!   v
//! commands/affected.rs, build.rs, graph.rs, run.rs:
//!   fn run_*(ctx: &RunContext, ...)
//! ```

use crate::core::config::KbcConfig;
use crate::core::error::{ConfigError, DiscoveryError, KbcError, KbcResult};
use crate::discovery::{self, Unit};
use crate::graph::{DependencyGraph, KustomizeGraph, TracingObserver};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the commands share: resolved config, discovered
/// kustomizations and their dependency graph.
pub struct RunContext {
  /// Directory kbc was started in (config search and relative roots)
  pub work_dir: PathBuf,

  /// Kustomization root (canonical path)
  pub root: PathBuf,

  /// Effective configuration
  pub config: Arc<KbcConfig>,

  /// Discovered kustomizations, sorted by directory
  pub units: Vec<Unit>,

  /// Files skipped during discovery
  pub warnings: Vec<DiscoveryError>,

  /// Dependency graph over `units`
  pub graph: KustomizeGraph,
}

impl RunContext {
  /// Resolve the root, discover kustomizations and build the graph.
  pub fn build(work_dir: &Path, config: KbcConfig) -> KbcResult<Self> {
    config.validate()?;

    let root = resolve_root(work_dir, &config.root_dir)?;
    tracing::info!(root = %root.display(), "Discovering kustomizations");

    let report = discovery::discover(&root, &config.exclude)?;
    tracing::info!(
      count = report.units.len(),
      skipped = report.warnings.len(),
      "Found kustomization files"
    );

    let mut graph = KustomizeGraph::new().with_observer(Arc::new(TracingObserver));
    graph.build(&report.units)?;

    Ok(Self {
      work_dir: work_dir.to_path_buf(),
      root,
      config: Arc::new(config),
      units: report.units,
      warnings: report.warnings,
      graph,
    })
  }

  /// Kustomization root as Path reference (convenience)
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Display form of a kustomization directory, relative to the root
  pub fn display_path(&self, dir: &Path) -> String {
    match dir.strip_prefix(&self.root) {
      Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
      Ok(rel) => rel.display().to_string(),
      Err(_) => dir.display().to_string(),
    }
  }
}

/// Canonical root so it lines up with git's (symlink-resolved) work tree.
fn resolve_root(work_dir: &Path, root_dir: &Path) -> KbcResult<PathBuf> {
  let root = work_dir.join(root_dir);
  if !root.is_dir() {
    return Err(KbcError::Config(ConfigError::RootNotFound { path: root }));
  }
  Ok(std::fs::canonicalize(&root)?)
}
