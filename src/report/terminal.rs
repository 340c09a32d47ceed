use super::Summary;
use crate::build::BuildResult;
use std::io::{self, Write};

/// Error lines shown per failed build
const MAX_ERROR_LINES: usize = 5;

const RULE_WIDTH: usize = 80;

/// Print build results and a one-line summary
pub fn print_results(out: &mut impl Write, results: &[BuildResult]) -> io::Result<()> {
  if results.is_empty() {
    writeln!(out, "✓ No kustomizations need testing")?;
    return Ok(());
  }

  writeln!(out, "\nKustomize Build Results:")?;
  writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

  for result in results {
    let secs = result.duration.as_secs_f64();
    if result.success {
      writeln!(out, "✅ {} - Build successful ({:.2}s)", result.path.display(), secs)?;
      continue;
    }

    writeln!(out, "❌ {} - Build failed ({:.2}s)", result.path.display(), secs)?;
    let mut lines = result.error_lines();
    for line in lines.by_ref().take(MAX_ERROR_LINES) {
      writeln!(out, "   {}", line)?;
    }
    if lines.next().is_some() {
      writeln!(out, "   ...")?;
    }
  }

  let summary = Summary::from_results(results);
  writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
  writeln!(
    out,
    "\nSummary: {} total, {} successful, {} failed",
    summary.total, summary.success, summary.failed
  )?;
  Ok(())
}
