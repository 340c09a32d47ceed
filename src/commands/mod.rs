//! CLI commands for kbc
//!
//! - **affected**: List kustomizations affected by changes
//! - **build**: Run `kustomize build` for affected (or all) kustomizations
//! - **graph**: Show the kustomization dependency graph
//! - **run**: GitHub Action mode (detect, build, report)
//!
//! All commands accept `&RunContext` so discovery and graph building
//! happen once.

pub mod affected;
pub mod build;
pub mod graph;
pub mod run;

pub use affected::{ChangeSource, run_affected};
pub use build::run_build;
pub use graph::run_graph;
pub use run::run_action;
