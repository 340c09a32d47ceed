//! Progress reporting hooks for graph construction and impact analysis
//!
//! The graph and the analyzer never log on their own. They report what they
//! do to a `GraphObserver`; the CLI plugs in one that forwards to `tracing`,
//! tests plug in one that records events.

use crate::discovery::ReferenceKind;
use std::path::{Path, PathBuf};

/// Why a declared reference did not become a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// Has a file extension, so it is a plain file
  FileReference,
  /// Resolves outside the discovered kustomizations (remote, out of scope)
  OutsideCollection,
}

/// How a changed file was tied to a kustomization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
  /// The kustomization file itself changed
  Manifest,
  /// A file the kustomization references (or lives under a referenced dir)
  Referenced,
}

/// Receives events from the graph builder and the impact analyzer.
///
/// Every method defaults to doing nothing.
pub trait GraphObserver: Send + Sync {
  fn node_added(&self, _directory: &Path) {}

  fn edge_added(&self, _dependent: &Path, _base: &Path, _kind: ReferenceKind) {}

  fn reference_skipped(&self, _owner: &Path, _reference: &str, _reason: SkipReason) {}

  fn graph_built(&self, _nodes: usize, _edges: usize) {}

  fn unit_changed(&self, _file: &Path, _unit: &Path, _cause: ChangeCause) {}

  fn dependents_added(&self, _base: &Path, _dependents: &[PathBuf]) {}

  fn analysis_finished(&self, _changed_files: usize, _affected: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GraphObserver for NoopObserver {}

/// Observer that forwards events to `tracing`.
///
/// Per-node events and skipped file references go out at trace level,
/// everything else at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GraphObserver for TracingObserver {
  fn node_added(&self, directory: &Path) {
    tracing::trace!(path = %directory.display(), "Added kustomization node");
  }

  fn edge_added(&self, dependent: &Path, base: &Path, kind: ReferenceKind) {
    tracing::debug!(
      dependent = %dependent.display(),
      base = %base.display(),
      field = %kind,
      "Linked kustomization to base"
    );
  }

  fn reference_skipped(&self, owner: &Path, reference: &str, reason: SkipReason) {
    match reason {
      SkipReason::FileReference => {
        tracing::trace!(owner = %owner.display(), reference, "Skipping file reference");
      }
      SkipReason::OutsideCollection => {
        tracing::debug!(
          owner = %owner.display(),
          reference,
          "Reference does not resolve to a discovered kustomization"
        );
      }
    }
  }

  fn graph_built(&self, nodes: usize, edges: usize) {
    tracing::debug!(nodes, edges, "Dependency graph built");
  }

  fn unit_changed(&self, file: &Path, unit: &Path, cause: ChangeCause) {
    match cause {
      ChangeCause::Manifest => {
        tracing::debug!(file = %file.display(), dir = %unit.display(), "Changed file is kustomization file");
      }
      ChangeCause::Referenced => {
        tracing::debug!(
          file = %file.display(),
          kustomization = %unit.display(),
          "Changed file referenced by kustomization"
        );
      }
    }
  }

  fn dependents_added(&self, base: &Path, dependents: &[PathBuf]) {
    if !dependents.is_empty() {
      tracing::debug!(
        base = %base.display(),
        dependent_count = dependents.len(),
        "Adding dependents to affected set"
      );
    }
  }

  fn analysis_finished(&self, changed_files: usize, affected: usize) {
    tracing::debug!(changed_files, affected_kustomizations = affected, "Impact analysis complete");
  }
}
