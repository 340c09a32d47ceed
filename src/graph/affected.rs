//! Affected kustomization analysis
//!
//! Given a set of changed files, determine:
//! - Which kustomizations directly own those files
//! - Which kustomizations transitively build on the changed ones
//! - The set of kustomizations that need `kustomize build`

use super::DependencyGraph;
use super::observer::{ChangeCause, GraphObserver, NoopObserver};
use crate::discovery::{Unit, is_kustomization_file};
use crate::utils::{anchor_path, normalize_path, resolve_reference};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Set of affected kustomizations from file changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedSet {
  /// Kustomizations whose manifest or referenced files changed
  pub direct: HashSet<PathBuf>,

  /// Transitive dependents of the direct set, minus the direct set itself
  pub dependents: HashSet<PathBuf>,

  /// Everything to build (direct + dependents)
  pub targets: HashSet<PathBuf>,
}

impl AffectedSet {
  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  /// Build targets in a stable order for display and execution.
  pub fn sorted_targets(&self) -> Vec<PathBuf> {
    sorted(&self.targets)
  }

  pub fn sorted_direct(&self) -> Vec<PathBuf> {
    sorted(&self.direct)
  }

  pub fn sorted_dependents(&self) -> Vec<PathBuf> {
    sorted(&self.dependents)
  }
}

fn sorted(set: &HashSet<PathBuf>) -> Vec<PathBuf> {
  let mut v: Vec<_> = set.iter().cloned().collect();
  v.sort();
  v
}

/// Complete affected analysis.
#[derive(Debug, Clone, Default)]
pub struct AffectedAnalysis {
  /// Files that changed (anchored and normalized)
  pub changed_files: Vec<PathBuf>,

  /// Impact set
  pub impact: AffectedSet,
}

/// Maps changed files to the kustomizations that must be rebuilt.
///
/// Pure: no I/O, no errors. Empty inputs give an empty result and files
/// that match nothing contribute nothing.
pub struct ImpactAnalyzer {
  /// Anchor for relative changed-file paths (usually the git work tree)
  root: Option<PathBuf>,
  observer: Arc<dyn GraphObserver>,
}

impl Default for ImpactAnalyzer {
  fn default() -> Self {
    Self::new()
  }
}

impl ImpactAnalyzer {
  pub fn new() -> Self {
    Self {
      root: None,
      observer: Arc::new(NoopObserver),
    }
  }

  /// Resolve relative changed-file paths against `root`.
  pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.root = Some(normalize_path(&root.into()));
    self
  }

  pub fn with_observer(mut self, observer: Arc<dyn GraphObserver>) -> Self {
    self.observer = observer;
    self
  }

  /// Directories of every kustomization that needs rebuilding.
  #[cfg(test)]
  pub fn affected(
    &self,
    changed_files: &[impl AsRef<Path>],
    graph: &dyn DependencyGraph,
    units: &[Unit],
  ) -> HashSet<PathBuf> {
    self.analyze(changed_files, graph, units).impact.targets
  }

  /// Analyze which kustomizations are affected by file changes.
  ///
  /// Algorithm:
  /// 1. Map each file to the kustomizations that own it (manifest or reference)
  /// 2. Add each owner, then its transitive dependents from the graph
  /// 3. Union all sets
  pub fn analyze(
    &self,
    changed_files: &[impl AsRef<Path>],
    graph: &dyn DependencyGraph,
    units: &[Unit],
  ) -> AffectedAnalysis {
    let changed: Vec<PathBuf> = changed_files
      .iter()
      .map(|file| anchor_path(self.root.as_deref(), file.as_ref()))
      .collect();

    let known_units: HashSet<PathBuf> = units.iter().map(|unit| normalize_path(&unit.directory)).collect();

    // Step 1: direct owners
    let mut direct = HashSet::new();
    for file in &changed {
      for (dir, cause) in self.owning_units(file, units, &known_units) {
        self.observer.unit_changed(file, &dir, cause);
        direct.insert(dir);
      }
    }

    // Step 2: self, then the whole dependent closure
    let mut targets = direct.clone();
    for dir in &direct {
      let dependents = graph.all_dependents(dir);
      self.observer.dependents_added(dir, &dependents);
      targets.extend(dependents.into_iter().map(|dep| normalize_path(&dep)));
    }

    let dependents = targets.difference(&direct).cloned().collect();
    self.observer.analysis_finished(changed.len(), targets.len());

    AffectedAnalysis {
      changed_files: changed,
      impact: AffectedSet {
        direct,
        dependents,
        targets,
      },
    }
  }

  /// Kustomizations directly changed by `file`.
  fn owning_units(&self, file: &Path, units: &[Unit], known_units: &HashSet<PathBuf>) -> Vec<(PathBuf, ChangeCause)> {
    let is_manifest = file
      .file_name()
      .and_then(|name| name.to_str())
      .is_some_and(is_kustomization_file);

    if is_manifest {
      let owner = file.parent().map(normalize_path).filter(|dir| known_units.contains(dir));
      if let Some(dir) = owner {
        return vec![(dir, ChangeCause::Manifest)];
      }
      // Deleted kustomization, or a base outside the scanned root: fall
      // through to the units that reference its directory.
    }

    units
      .iter()
      .filter(|unit| file_referenced_by_unit(file, unit))
      .map(|unit| (normalize_path(&unit.directory), ChangeCause::Referenced))
      .collect()
  }
}

/// Whether `file` is one of the unit's references (or inputs), or lives
/// under a referenced directory.
///
/// Matching is component-wise: `/r/base-old/x.yaml` is not under `/r/base`.
pub fn file_referenced_by_unit(file: &Path, unit: &Unit) -> bool {
  let file = normalize_path(file);
  let dir = normalize_path(&unit.directory);

  unit
    .watched_paths()
    .any(|reference| file.starts_with(resolve_reference(&dir, reference)))
}
