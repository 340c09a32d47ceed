//! Kustomization dependency graph built from discovered units + petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A references B" (A is an overlay of B)
//! - **Nodes**: one per discovered kustomization directory
//! - **Edges**: one per resolved reference, weighted by the declaring field;
//!   parallel edges are kept when an overlay names the same base twice
//! - **Index**: canonical directory → node index
//! - **Reverse lookup**: incoming edges of a base, in insertion order
//!
//! Construction is two-pass so references resolve regardless of unit order.
//! Resolution is best-effort: file references and references that land
//! outside the discovered collection are dropped, never reported as errors.

use super::DependencyGraph;
use super::observer::{GraphObserver, NoopObserver, SkipReason};
use crate::core::error::GraphError;
use crate::discovery::{ReferenceKind, Unit};
use crate::utils::{has_file_extension, normalize_path, path_to_display, resolve_reference};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A kustomization node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNode {
  pub path: PathBuf,
  /// Referenced by at least one other kustomization
  pub is_base: bool,
  /// Candidate directory references as written (diagnostics only)
  pub dependencies: Vec<String>,
}

/// Dependency graph over kustomization directories.
pub struct KustomizeGraph {
  graph: DiGraph<UnitNode, ReferenceKind>,

  /// Index: canonical directory → node index
  path_to_node: HashMap<PathBuf, NodeIndex>,

  observer: Arc<dyn GraphObserver>,
}

impl Default for KustomizeGraph {
  fn default() -> Self {
    Self::new()
  }
}

impl KustomizeGraph {
  /// Empty graph reporting to nobody.
  pub fn new() -> Self {
    Self {
      graph: DiGraph::new(),
      path_to_node: HashMap::new(),
      observer: Arc::new(NoopObserver),
    }
  }

  /// Report construction progress to `observer`.
  pub fn with_observer(mut self, observer: Arc<dyn GraphObserver>) -> Self {
    self.observer = observer;
    self
  }

  /// Build a graph from `units` in one step.
  #[cfg(test)]
  pub fn from_units(units: &[Unit]) -> Result<Self, GraphError> {
    let mut graph = Self::new();
    graph.build(units)?;
    Ok(graph)
  }

  /// Look up a node by directory.
  pub fn node(&self, path: &Path) -> Option<&UnitNode> {
    self.find_node(path).map(|idx| &self.graph[idx])
  }

  /// All kustomization directories, sorted.
  pub fn units(&self) -> Vec<PathBuf> {
    let mut units: Vec<_> = self.path_to_node.keys().cloned().collect();
    units.sort();
    units
  }

  /// Directories referenced by at least one other kustomization, sorted.
  pub fn bases(&self) -> Vec<PathBuf> {
    let mut bases: Vec<_> = self
      .graph
      .node_weights()
      .filter(|node| node.is_base)
      .map(|node| node.path.clone())
      .collect();
    bases.sort();
    bases
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Detect reference cycles using Tarjan's SCC algorithm.
  ///
  /// A kustomization that references itself counts as a cycle of one.
  /// Each cycle is sorted; the list of cycles is sorted too.
  pub fn find_cycles(&self) -> Vec<Vec<PathBuf>> {
    let mut cycles: Vec<Vec<PathBuf>> = algo::tarjan_scc(&self.graph)
      .into_iter()
      .filter(|component| component.len() > 1 || self.graph.contains_edge(component[0], component[0]))
      .map(|component| {
        let mut cycle: Vec<_> = component.into_iter().map(|idx| self.graph[idx].path.clone()).collect();
        cycle.sort();
        cycle
      })
      .collect();
    cycles.sort();
    cycles
  }

  /// Export graph to DOT format (Graphviz).
  ///
  /// ```bash
  /// kbc graph --format dot > graph.dot
  /// dot -Tpng graph.dot -o graph.png
  /// ```
  pub fn to_dot(&self) -> String {
    use petgraph::dot::{Config, Dot};

    let dot = Dot::with_attr_getters(
      &self.graph,
      &[Config::EdgeNoLabel, Config::NodeNoLabel],
      &|_, edge_ref| match edge_ref.weight() {
        ReferenceKind::Resource => String::new(),
        ReferenceKind::Base => "color=orange label=\"bases\"".to_string(),
        ReferenceKind::Component => "color=blue label=\"components\"".to_string(),
      },
      &|_, (_idx, node)| {
        let label = path_to_display(&node.path).replace('"', "\\\"");
        if node.is_base {
          format!("label=\"{}\" shape=box style=filled fillcolor=lightblue", label)
        } else {
          format!("label=\"{}\" shape=box", label)
        }
      },
    );

    format!("{:?}", dot)
  }

  fn find_node(&self, path: &Path) -> Option<NodeIndex> {
    self.path_to_node.get(&normalize_path(path)).copied()
  }

  /// Direct dependents of a node, in the order their edges were added.
  fn dependent_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Incoming).collect();
    edges.sort_by_key(|edge| edge.id());
    edges.into_iter().map(|edge| edge.source()).collect()
  }
}

/// Directory candidates declared by a unit: every reference without a file
/// extension, from resources, bases and components in that order.
pub fn extract_dependencies(unit: &Unit) -> Vec<(ReferenceKind, &str)> {
  unit
    .references()
    .filter(|(_, reference)| !has_file_extension(reference))
    .collect()
}

impl DependencyGraph for KustomizeGraph {
  fn build(&mut self, units: &[Unit]) -> Result<(), GraphError> {
    let mut graph: DiGraph<UnitNode, ReferenceKind> = DiGraph::with_capacity(units.len(), units.len());
    let mut path_to_node = HashMap::with_capacity(units.len());

    // First pass: one node per unit
    for unit in units {
      if !unit.directory.is_absolute() {
        return Err(GraphError::RelativeDirectory {
          directory: unit.directory.clone(),
        });
      }

      let path = normalize_path(&unit.directory);
      if path_to_node.contains_key(&path) {
        return Err(GraphError::DuplicateUnit { directory: path });
      }

      let idx = graph.add_node(UnitNode {
        path: path.clone(),
        is_base: false,
        dependencies: Vec::new(),
      });
      self.observer.node_added(&path);
      path_to_node.insert(path, idx);
    }

    // Second pass: resolve references against the complete node set
    for unit in units {
      let owner = normalize_path(&unit.directory);
      let owner_idx = path_to_node[&owner];

      for (_, reference) in unit.references().filter(|(_, r)| has_file_extension(r)) {
        self.observer.reference_skipped(&owner, reference, SkipReason::FileReference);
      }

      let deps = extract_dependencies(unit);
      graph[owner_idx].dependencies = deps.iter().map(|(_, r)| r.to_string()).collect();

      for (kind, reference) in deps {
        let resolved = resolve_reference(&owner, reference);

        match path_to_node.get(&resolved) {
          Some(&base_idx) => {
            graph[base_idx].is_base = true;
            graph.add_edge(owner_idx, base_idx, kind);
            self.observer.edge_added(&owner, &resolved, kind);
          }
          None => {
            self.observer.reference_skipped(&owner, reference, SkipReason::OutsideCollection);
          }
        }
      }
    }

    self.graph = graph;
    self.path_to_node = path_to_node;
    self.observer.graph_built(self.graph.node_count(), self.graph.edge_count());

    Ok(())
  }

  fn is_base(&self, path: &Path) -> bool {
    self.node(path).is_some_and(|node| node.is_base)
  }

  fn direct_dependents(&self, base: &Path) -> Vec<PathBuf> {
    match self.find_node(base) {
      Some(idx) => self
        .dependent_indices(idx)
        .into_iter()
        .map(|dep| self.graph[dep].path.clone())
        .collect(),
      None => Vec::new(),
    }
  }

  /// Walks incoming edges depth-first with an explicit stack. Each node is
  /// emitted at most once, so cycles terminate. The start node itself only
  /// shows up if a cycle leads back to it.
  fn all_dependents(&self, path: &Path) -> Vec<PathBuf> {
    let Some(start) = self.find_node(path) else {
      return Vec::new();
    };

    let mut visited = HashSet::new();
    let mut result = Vec::new();
    let mut stack = vec![self.dependent_indices(start).into_iter()];

    while let Some(frontier) = stack.last_mut() {
      match frontier.next() {
        Some(dep) => {
          if visited.insert(dep) {
            result.push(self.graph[dep].path.clone());
            stack.push(self.dependent_indices(dep).into_iter());
          }
        }
        None => {
          stack.pop();
        }
      }
    }

    result
  }
}

impl fmt::Display for KustomizeGraph {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Dependency Graph:")?;

    for path in self.units() {
      let Some(node) = self.node(&path) else {
        continue;
      };
      let marker = if node.is_base { " [BASE]" } else { "" };
      writeln!(f, "  {}{}", path_to_display(&path), marker)?;

      if !node.dependencies.is_empty() {
        writeln!(f, "    Dependencies:")?;
        for dep in &node.dependencies {
          writeln!(f, "      - {}", dep)?;
        }
      }

      let used_by = self.direct_dependents(&path);
      if !used_by.is_empty() {
        writeln!(f, "    Used by:")?;
        for overlay in used_by {
          writeln!(f, "      - {}", path_to_display(&overlay))?;
        }
      }
    }

    Ok(())
  }
}
