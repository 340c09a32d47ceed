//! Kustomization dependency graph and affected analysis
//!
//! Built on petgraph. Edges point from an overlay to the base it consumes;
//! affected analysis walks them backwards, from a changed base to everything
//! built on top of it.

pub mod affected;
pub mod kustomize_graph;
pub mod observer;

pub use affected::{AffectedAnalysis, AffectedSet, ImpactAnalyzer};
pub use kustomize_graph::{KustomizeGraph, UnitNode};
pub use observer::{GraphObserver, NoopObserver, TracingObserver};

use crate::core::error::GraphError;
use crate::discovery::Unit;
use std::path::{Path, PathBuf};

/// Build-and-query capability of a kustomization dependency graph.
///
/// Query results are owned copies; callers can never reach into the graph.
pub trait DependencyGraph {
  /// Rebuild the graph from the full unit collection.
  fn build(&mut self, units: &[Unit]) -> Result<(), GraphError>;

  /// Whether another kustomization references `path`.
  fn is_base(&self, path: &Path) -> bool;

  /// Kustomizations that reference `base` directly, in declaration order.
  fn direct_dependents(&self, base: &Path) -> Vec<PathBuf>;

  /// Every kustomization that reaches `path` through references, depth-first.
  fn all_dependents(&self, path: &Path) -> Vec<PathBuf>;
}
