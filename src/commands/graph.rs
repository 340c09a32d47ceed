//! `kbc graph` - Show the kustomization dependency graph
//!
//! Formats: text (tree with bases and their users), dot (Graphviz), json.

use crate::core::context::RunContext;
use crate::core::error::{KbcError, KbcResult};
use crate::graph::DependencyGraph;
use serde::Serialize;

/// Output format for graph command
#[derive(Debug, Clone, Copy)]
enum OutputFormat {
  Text,
  Dot,
  Json,
}

impl OutputFormat {
  fn from_str(s: &str) -> KbcResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "dot" => Ok(Self::Dot),
      "json" => Ok(Self::Json),
      _ => Err(KbcError::message(format!(
        "Unknown format '{}'. Valid formats: text, dot, json",
        s
      ))),
    }
  }
}

#[derive(Serialize)]
struct GraphNode {
  path: String,
  is_base: bool,
  dependencies: Vec<String>,
  used_by: Vec<String>,
}

#[derive(Serialize)]
struct GraphReport {
  root: String,
  nodes: Vec<GraphNode>,
  edge_count: usize,
  cycles: Vec<Vec<String>>,
  /// Kustomization files left out during discovery
  skipped: Vec<String>,
}

/// Run the graph command
pub fn run_graph(ctx: &RunContext, format: String) -> KbcResult<()> {
  let output_format = OutputFormat::from_str(&format)?;
  let graph = &ctx.graph;
  tracing::info!(
    nodes = graph.node_count(),
    bases = graph.bases().len(),
    edges = graph.edge_count(),
    "Loaded dependency graph"
  );

  let cycles = graph.find_cycles();
  for cycle in &cycles {
    let members: Vec<_> = cycle.iter().map(|dir| ctx.display_path(dir)).collect();
    tracing::warn!(members = ?members, "Reference cycle between kustomizations");
  }

  match output_format {
    OutputFormat::Text => print!("{}", graph),
    OutputFormat::Dot => println!("{}", graph.to_dot()),
    OutputFormat::Json => {
      let nodes = graph
        .units()
        .into_iter()
        .filter_map(|dir| {
          let node = graph.node(&dir)?;
          Some(GraphNode {
            path: ctx.display_path(&dir),
            is_base: node.is_base,
            dependencies: node.dependencies.clone(),
            used_by: graph
              .direct_dependents(&dir)
              .iter()
              .map(|dep| ctx.display_path(dep))
              .collect(),
          })
        })
        .collect();

      let report = GraphReport {
        root: ctx.root().display().to_string(),
        nodes,
        edge_count: graph.edge_count(),
        cycles: cycles
          .iter()
          .map(|cycle| cycle.iter().map(|dir| ctx.display_path(dir)).collect())
          .collect(),
        skipped: ctx.warnings.iter().map(|w| w.to_string()).collect(),
      };
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
  }

  Ok(())
}
