//! Error types for kbc with contextual messages and exit codes
//!
//! One error type for the whole program. Each category carries enough
//! context to print a useful message, and most carry a help line that points
//! the user at the fix.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for kbc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Validation failure (inconsistent kustomization tree)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for kbc
#[derive(Debug)]
pub enum KbcError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Dependency graph could not be built
  Graph(GraphError),

  /// Kustomization discovery errors
  Discovery(DiscoveryError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl KbcError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    KbcError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    KbcError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      KbcError::Message { message, context, help } => KbcError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      KbcError::Io(err) => KbcError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      KbcError::Config(_) => ExitCode::User,
      KbcError::Git(_) => ExitCode::System,
      KbcError::Graph(_) => ExitCode::Validation,
      KbcError::Discovery(_) => ExitCode::User,
      KbcError::Io(_) => ExitCode::System,
      KbcError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      KbcError::Config(e) => e.help_message(),
      KbcError::Git(e) => e.help_message(),
      KbcError::Graph(e) => e.help_message(),
      KbcError::Discovery(e) => e.help_message(),
      KbcError::Message { help, .. } => help.clone(),
      KbcError::Io(_) => None,
    }
  }
}

impl fmt::Display for KbcError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KbcError::Config(e) => write!(f, "{}", e),
      KbcError::Git(e) => write!(f, "{}", e),
      KbcError::Graph(e) => write!(f, "{}", e),
      KbcError::Discovery(e) => write!(f, "{}", e),
      KbcError::Io(e) => write!(f, "I/O error: {}", e),
      KbcError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for KbcError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      KbcError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for KbcError {
  fn from(err: io::Error) -> Self {
    KbcError::Io(err)
  }
}

impl From<String> for KbcError {
  fn from(msg: String) -> Self {
    KbcError::message(msg)
  }
}

impl From<&str> for KbcError {
  fn from(msg: &str) -> Self {
    KbcError::message(msg)
  }
}

impl From<GraphError> for KbcError {
  fn from(err: GraphError) -> Self {
    KbcError::Graph(err)
  }
}

impl From<toml_edit::de::Error> for KbcError {
  fn from(err: toml_edit::de::Error) -> Self {
    KbcError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for KbcError {
  fn from(err: serde_json::Error) -> Self {
    KbcError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for KbcError {
  fn from(err: serde_yaml::Error) -> Self {
    KbcError::message(format!("YAML error: {}", err))
  }
}

impl From<walkdir::Error> for KbcError {
  fn from(err: walkdir::Error) -> Self {
    KbcError::message(format!("Directory walk error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for KbcError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    KbcError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::env::VarError> for KbcError {
  fn from(err: std::env::VarError) -> Self {
    KbcError::message(format!("Environment variable error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// A config value failed validation
  InvalidValue { field: String, reason: String },

  /// Root directory to scan does not exist
  RootNotFound { path: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::InvalidValue { field, .. } => Some(format!(
        "Fix `{}` in kbc.toml or override it on the command line.",
        field
      )),
      ConfigError::RootNotFound { .. } => {
        Some("Pass --root-dir (or INPUT_ROOT-DIR) pointing at the directory holding your kustomizations.".to_string())
      }
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidValue { field, reason } => {
        write!(f, "Invalid configuration value for {}: {}", field, reason)
      }
      ConfigError::RootNotFound { path } => {
        write!(f, "Root directory not found: {}", path.display())
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::CommandFailed { stderr, .. } => {
        if stderr.contains("unknown revision") || stderr.contains("bad revision") {
          Some(
            "The base ref is not available locally. In CI, fetch full history (e.g. `fetch-depth: 0`) or pass an existing ref with --base."
              .to_string(),
          )
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run kbc inside a git checkout, or check the path: {}",
        path.display()
      )),
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// The kustomization collection is structurally inconsistent.
///
/// Individual references never produce this; unresolvable ones are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
  /// Two units normalize to the same directory
  DuplicateUnit { directory: PathBuf },

  /// A unit directory is not an absolute path
  RelativeDirectory { directory: PathBuf },
}

impl GraphError {
  fn help_message(&self) -> Option<String> {
    match self {
      GraphError::DuplicateUnit { .. } => Some(
        "Keep a single kustomization file (kustomization.yaml, kustomization.yml or Kustomization) per directory."
          .to_string(),
      ),
      GraphError::RelativeDirectory { .. } => None,
    }
  }
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::DuplicateUnit { directory } => {
        write!(f, "Duplicate kustomization directory: {}", directory.display())
      }
      GraphError::RelativeDirectory { directory } => {
        write!(f, "Kustomization directory must be absolute: {}", directory.display())
      }
    }
  }
}

impl std::error::Error for GraphError {}

/// Discovery errors
#[derive(Debug)]
pub enum DiscoveryError {
  /// A kustomization file could not be parsed
  Parse { path: PathBuf, reason: String },
}

impl DiscoveryError {
  fn help_message(&self) -> Option<String> {
    match self {
      DiscoveryError::Parse { .. } => {
        Some("Check the file is valid YAML and that list fields hold strings.".to_string())
      }
    }
  }
}

impl fmt::Display for DiscoveryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DiscoveryError::Parse { path, reason } => {
        write!(f, "Failed to parse {}: {}", path.display(), reason)
      }
    }
  }
}

/// Result type alias for kbc
pub type KbcResult<T> = Result<T, KbcError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> KbcResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> KbcResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<KbcError>,
{
  fn context(self, ctx: impl Into<String>) -> KbcResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> KbcResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &KbcError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for KbcError {
  fn from(err: anyhow::Error) -> Self {
    KbcError::message(err.to_string())
  }
}
