//! Running `kustomize build`
//!
//! Each build is one `kustomize build [--enable-helm] <dir>` subprocess with
//! captured output and a hard timeout. Builds run one after another.

use crate::core::config::KbcConfig;
use crate::ui::progress::BuildProgress;
use serde::{Serialize, Serializer};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of one kustomize build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildResult {
  pub path: PathBuf,
  pub success: bool,
  /// Rendered manifests (stdout)
  pub output: String,
  /// Failure description followed by kustomize's stderr; empty on success
  pub error: String,
  #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
  pub duration: Duration,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(duration.as_secs_f64())
}

impl BuildResult {
  /// Leading lines of the error, skipping blanks
  pub fn error_lines(&self) -> impl Iterator<Item = &str> {
    self.error.lines().filter(|line| !line.trim().is_empty())
  }
}

/// Runs kustomize against kustomization directories
#[derive(Debug, Clone)]
pub struct KustomizeBuilder {
  bin: String,
  enable_helm: bool,
  timeout: Duration,
  work_dir: Option<PathBuf>,
  show_progress: bool,
}

impl KustomizeBuilder {
  pub fn new(bin: impl Into<String>, enable_helm: bool, timeout: Duration) -> Self {
    Self {
      bin: bin.into(),
      enable_helm,
      timeout,
      work_dir: None,
      show_progress: false,
    }
  }

  pub fn from_config(config: &KbcConfig) -> Self {
    Self::new(&config.kustomize_bin, config.enable_helm, config.timeout())
  }

  /// Run kustomize from `dir`, so relative build paths resolve against it
  pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.work_dir = Some(dir.into());
    self
  }

  /// Draw a progress bar during `build_all` (terminal only)
  pub fn with_progress(mut self, show: bool) -> Self {
    self.show_progress = show;
    self
  }

  /// Arguments passed to kustomize for `path`
  pub fn args(&self, path: &Path) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    if self.enable_helm {
      args.push("--enable-helm".to_string());
    }
    args.push(path.display().to_string());
    args
  }

  /// Command line as shown in dry runs
  pub fn command_line(&self, path: &Path) -> String {
    format!("{} {}", self.bin, self.args(path).join(" "))
  }

  /// Build one kustomization. Never fails: problems land in the result.
  pub fn build(&self, path: &Path) -> BuildResult {
    let start = Instant::now();
    tracing::debug!(
      path = %path.display(),
      enable_helm = self.enable_helm,
      args = ?self.args(path),
      "Starting kustomize build"
    );

    let mut cmd = Command::new(&self.bin);
    cmd
      .args(self.args(path))
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    if let Some(dir) = &self.work_dir {
      cmd.current_dir(dir);
    }

    let (status, stdout, stderr) = match cmd.spawn() {
      Ok(child) => self.wait(child, path),
      Err(err) => (
        Outcome::SpawnFailed(format!("failed to run {}: {}", self.bin, err)),
        String::new(),
        String::new(),
      ),
    };
    let duration = start.elapsed();

    let result = match status {
      Outcome::Exited(status) if status.success() => BuildResult {
        path: path.to_path_buf(),
        success: true,
        output: stdout,
        error: String::new(),
        duration,
      },
      outcome => BuildResult {
        path: path.to_path_buf(),
        success: false,
        output: stdout,
        error: format!("{}\n{}", outcome.describe(self.timeout), stderr),
        duration,
      },
    };

    if result.success {
      tracing::debug!(path = %path.display(), ?duration, "Kustomize build succeeded");
    } else {
      tracing::debug!(path = %path.display(), ?duration, "Kustomize build failed");
    }
    result
  }

  /// Build every path in order
  pub fn build_all(&self, paths: &[PathBuf]) -> Vec<BuildResult> {
    let mut progress = if self.show_progress {
      BuildProgress::new(paths.len(), "Building kustomizations")
    } else {
      None
    };

    paths
      .iter()
      .map(|path| {
        let result = self.build(path);
        if let Some(progress) = progress.as_mut() {
          progress.inc();
        }
        result
      })
      .collect()
  }

  /// Wait for the child, killing it once the timeout passes
  fn wait(&self, mut child: Child, path: &Path) -> (Outcome, String, String) {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + self.timeout;
    let outcome = loop {
      match child.try_wait() {
        Ok(Some(status)) => break Outcome::Exited(status),
        Ok(None) if Instant::now() >= deadline => {
          tracing::warn!(path = %path.display(), "Kustomize build timeout, killing process");
          // The child may exit on its own between try_wait and kill
          let _ = child.kill();
          let _ = child.wait();
          break Outcome::TimedOut;
        }
        Ok(None) => thread::sleep(POLL_INTERVAL),
        Err(err) => {
          let _ = child.kill();
          let _ = child.wait();
          break Outcome::SpawnFailed(format!("failed to wait for {}: {}", self.bin, err));
        }
      }
    };

    (outcome, join(stdout), join(stderr))
  }
}

enum Outcome {
  Exited(ExitStatus),
  TimedOut,
  SpawnFailed(String),
}

impl Outcome {
  fn describe(&self, timeout: Duration) -> String {
    match self {
      Outcome::Exited(status) => status.to_string(),
      Outcome::TimedOut => format!("timed out after {}s", timeout.as_secs_f64()),
      Outcome::SpawnFailed(message) => message.clone(),
    }
  }
}

/// Read a pipe to the end on its own thread so a chatty child never blocks
fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
  thread::spawn(move || {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
  })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
  handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
