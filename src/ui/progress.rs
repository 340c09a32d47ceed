//! Progress indicators for long-running operations
//!
//! Uses `linya` progress bars drawn on stderr. Bars are only shown when
//! stderr is a terminal, so CI logs and piped output stay clean.

use linya::{Bar, Progress};
use std::io::IsTerminal;

/// Progress bar for a batch of kustomize builds
pub struct BuildProgress {
  progress: Progress,
  bar: Bar,
}

impl BuildProgress {
  /// Create a progress bar, or `None` when stderr is not a terminal
  pub fn new(total: usize, label: impl Into<String>) -> Option<Self> {
    if total == 0 || !std::io::stderr().is_terminal() {
      return None;
    }
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Some(Self { progress, bar })
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
