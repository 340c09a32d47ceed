use crate::core::error::{ConfigError, KbcError, KbcResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for kbc
/// Searched in order: kbc.toml, .kbc.toml, .config/kbc.toml
///
/// Every field is optional. Values are layered: defaults, then the config
/// file, then GitHub Action inputs (`INPUT_*`), then command-line flags.
///
/// # Example
///
/// ```toml
/// root_dir = "clusters"
/// base_ref = "origin/main"
/// enable_helm = false
/// timeout_secs = 300
/// exclude = ["charts"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KbcConfig {
  /// Directory scanned for kustomizations
  pub root_dir: PathBuf,

  /// Git ref to diff from
  pub base_ref: String,

  /// Git ref to diff to
  pub head_ref: String,

  /// Pass `--enable-helm` to kustomize
  pub enable_helm: bool,

  /// Exit non-zero when any build fails
  pub fail_on_error: bool,

  /// Per-build timeout in seconds
  pub timeout_secs: u64,

  /// kustomize executable
  pub kustomize_bin: String,

  /// Directory names skipped during discovery (hidden directories always are)
  pub exclude: Vec<String>,
}

impl Default for KbcConfig {
  fn default() -> Self {
    Self {
      root_dir: PathBuf::from("."),
      base_ref: "HEAD~1".to_string(),
      head_ref: "HEAD".to_string(),
      enable_helm: true,
      fail_on_error: true,
      timeout_secs: 120,
      kustomize_bin: "kustomize".to_string(),
      exclude: Vec::new(),
    }
  }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub root_dir: Option<PathBuf>,
  pub base_ref: Option<String>,
  pub head_ref: Option<String>,
  pub enable_helm: Option<bool>,
  pub fail_on_error: Option<bool>,
  pub timeout_secs: Option<u64>,
  pub kustomize_bin: Option<String>,
}

impl KbcConfig {
  /// Find config file in search order: kbc.toml, .kbc.toml, .config/kbc.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("kbc.toml"),
      path.join(".kbc.toml"),
      path.join(".config").join("kbc.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from `path` (searches multiple locations), or defaults if
  /// there is no config file.
  pub fn load(path: &Path) -> KbcResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: KbcConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "Loaded configuration");
    Ok(config)
  }

  /// Apply GitHub Action inputs read through `lookup`.
  ///
  /// Recognized: `INPUT_BASE-REF`, `INPUT_ENABLE-HELM`, `INPUT_FAIL-ON-ERROR`,
  /// `INPUT_ROOT-DIR`. Empty values are ignored.
  pub fn apply_action_inputs<F>(&mut self, lookup: F) -> KbcResult<()>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(base_ref) = get("INPUT_BASE-REF") {
      self.base_ref = base_ref;
    }
    if let Some(enable_helm) = get("INPUT_ENABLE-HELM") {
      self.enable_helm = parse_bool("INPUT_ENABLE-HELM", &enable_helm)?;
    }
    if let Some(fail_on_error) = get("INPUT_FAIL-ON-ERROR") {
      self.fail_on_error = parse_bool("INPUT_FAIL-ON-ERROR", &fail_on_error)?;
    }
    if let Some(root_dir) = get("INPUT_ROOT-DIR") {
      self.root_dir = PathBuf::from(root_dir);
    }

    Ok(())
  }

  /// Apply GitHub Action inputs from the process environment.
  pub fn apply_env(&mut self) -> KbcResult<()> {
    self.apply_action_inputs(|key| std::env::var(key).ok())
  }

  /// Apply command-line overrides.
  pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
    if let Some(root_dir) = overrides.root_dir {
      self.root_dir = root_dir;
    }
    if let Some(base_ref) = overrides.base_ref {
      self.base_ref = base_ref;
    }
    if let Some(head_ref) = overrides.head_ref {
      self.head_ref = head_ref;
    }
    if let Some(enable_helm) = overrides.enable_helm {
      self.enable_helm = enable_helm;
    }
    if let Some(fail_on_error) = overrides.fail_on_error {
      self.fail_on_error = fail_on_error;
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
      self.timeout_secs = timeout_secs;
    }
    if let Some(kustomize_bin) = overrides.kustomize_bin {
      self.kustomize_bin = kustomize_bin;
    }
  }

  /// Validate configuration
  pub fn validate(&self) -> KbcResult<()> {
    if self.timeout_secs == 0 {
      return Err(invalid("timeout_secs", "must be greater than zero"));
    }
    if self.kustomize_bin.trim().is_empty() {
      return Err(invalid("kustomize_bin", "must not be empty"));
    }
    if self.base_ref.trim().is_empty() {
      return Err(invalid("base_ref", "must not be empty"));
    }
    if self.head_ref.trim().is_empty() {
      return Err(invalid("head_ref", "must not be empty"));
    }
    Ok(())
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

fn invalid(field: &str, reason: impl Into<String>) -> KbcError {
  KbcError::Config(ConfigError::InvalidValue {
    field: field.to_string(),
    reason: reason.into(),
  })
}

fn parse_bool(field: &str, value: &str) -> KbcResult<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "true" => Ok(true),
    "false" => Ok(false),
    other => Err(invalid(field, format!("expected 'true' or 'false', got '{}'", other))),
  }
}
