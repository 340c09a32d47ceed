//! GitHub Actions integration
//!
//! Step outputs go to the file named by `GITHUB_OUTPUT`, the Markdown job
//! summary to `GITHUB_STEP_SUMMARY`. Both are appended to; when a variable
//! is unset we are not running in Actions and nothing is written.

use super::Summary;
use crate::build::BuildResult;
use crate::core::error::{KbcResult, ResultExt};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Error lines kept per failed build in the job summary
const MAX_SUMMARY_ERROR_LINES: usize = 10;

/// Write outputs and job summary if the Actions environment asks for them
pub fn publish_github(results: &[BuildResult]) -> KbcResult<()> {
  if let Some(path) = env_path("GITHUB_OUTPUT") {
    write_github_outputs(&path, results)?;
  }
  if let Some(path) = env_path("GITHUB_STEP_SUMMARY") {
    write_step_summary(&path, results)?;
  }
  Ok(())
}

fn env_path(key: &str) -> Option<PathBuf> {
  std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Append `failed-count`, `success-count` and `results` (JSON) outputs
pub fn write_github_outputs(path: &Path, results: &[BuildResult]) -> KbcResult<()> {
  let summary = Summary::from_results(results);
  let results_json = serde_json::to_string(results)?;

  let mut content = String::new();
  let _ = writeln!(content, "failed-count={}", summary.failed);
  let _ = writeln!(content, "success-count={}", summary.success);
  let _ = writeln!(content, "results={}", results_json);

  append(path, &content).with_context(|| format!("Failed to write GITHUB_OUTPUT at {}", path.display()))?;
  tracing::debug!(path = %path.display(), "Wrote GitHub outputs");
  Ok(())
}

/// Append the Markdown job summary
pub fn write_step_summary(path: &Path, results: &[BuildResult]) -> KbcResult<()> {
  append(path, &render_step_summary(results))
    .with_context(|| format!("Failed to write GITHUB_STEP_SUMMARY at {}", path.display()))?;
  tracing::debug!(path = %path.display(), "Wrote GitHub step summary");
  Ok(())
}

/// Markdown job summary: counts table, failed builds with their first
/// error lines, passed builds folded away.
pub fn render_step_summary(results: &[BuildResult]) -> String {
  let summary = Summary::from_results(results);
  let mut md = String::new();

  md.push_str("## Kustomize Build Check Results\n\n");
  md.push_str("| Metric | Count |\n");
  md.push_str("|--------|-------|\n");
  let _ = writeln!(md, "| Total Builds | {} |", summary.total);
  let _ = writeln!(md, "| ✅ Passed | {} |", summary.success);
  let _ = writeln!(md, "| ❌ Failed | {} |", summary.failed);
  md.push('\n');

  if summary.failed > 0 {
    md.push_str("### ❌ Build Errors\n\n");
    for result in results.iter().filter(|r| !r.success) {
      let _ = writeln!(md, "- **{}**", result.path.display());
      md.push_str("```\n");
      let lines: Vec<&str> = result.error.trim_end().lines().collect();
      if lines.len() > MAX_SUMMARY_ERROR_LINES {
        md.push_str(&lines[..MAX_SUMMARY_ERROR_LINES].join("\n"));
        let _ = write!(md, "\n... (+{} more lines)", lines.len() - MAX_SUMMARY_ERROR_LINES);
      } else {
        md.push_str(&lines.join("\n"));
      }
      md.push_str("\n```\n");
    }
    md.push('\n');
  }

  if summary.success > 0 {
    md.push_str("### ✅ Successful Builds\n\n");
    md.push_str("<details>\n<summary>Click to see passed builds</summary>\n\n");
    for result in results.iter().filter(|r| r.success) {
      let _ = writeln!(md, "- {} ({:.2}s)", result.path.display(), result.duration.as_secs_f64());
    }
    md.push_str("\n</details>\n");
  }

  md
}

fn append(path: &Path, content: &str) -> std::io::Result<()> {
  let mut file = OpenOptions::new().create(true).append(true).open(path)?;
  file.write_all(content.as_bytes())
}
