//! Build result reporting
//!
//! - **terminal**: human-readable results on stdout
//! - **github**: GitHub Actions step outputs and job summary
//!
//! JSON output lives here since every command that builds can emit it.

pub mod github;
pub mod terminal;

pub use github::{publish_github, render_step_summary, write_github_outputs, write_step_summary};
pub use terminal::print_results;

use crate::build::BuildResult;
use serde::Serialize;

/// Aggregate counts over a batch of builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub total: usize,
  pub success: usize,
  pub failed: usize,
}

impl Summary {
  pub fn from_results(results: &[BuildResult]) -> Self {
    let success = results.iter().filter(|r| r.success).count();
    Self {
      total: results.len(),
      success,
      failed: results.len() - success,
    }
  }

  pub fn all_passed(&self) -> bool {
    self.failed == 0
  }
}

/// Machine-readable report (`--format json`)
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
  pub generated_at: String,
  pub summary: Summary,
  pub results: &'a [BuildResult],
}

impl<'a> JsonReport<'a> {
  pub fn new(results: &'a [BuildResult]) -> Self {
    Self {
      generated_at: chrono::Utc::now().to_rfc3339(),
      summary: Summary::from_results(results),
      results,
    }
  }
}
