//! Kustomization discovery
//!
//! Walks a directory tree, finds every kustomization file and parses the
//! fields that matter for dependency analysis. Everything else in the file
//! is ignored.
//!
//! - **unit**: the parsed `Unit` handed to the graph builder

pub mod unit;

pub use unit::{ReferenceKind, Unit, is_kustomization_file};

use crate::core::error::{ConfigError, DiscoveryError, KbcError, KbcResult, ResultExt};
use crate::utils::normalize_path;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Units found under a root, plus the files that were skipped.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
  /// Sorted by directory
  pub units: Vec<Unit>,
  /// Unparseable files and duplicate kustomizations in one directory
  pub warnings: Vec<DiscoveryError>,
}

/// Kustomization fields we read. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KustomizationManifest {
  resources: Option<Vec<String>>,
  bases: Option<Vec<String>>,
  components: Option<Vec<String>>,
  patches_strategic_merge: Option<Vec<String>>,
  patches: Option<Vec<PatchEntry>>,
  config_map_generator: Option<Vec<GeneratorEntry>>,
  secret_generator: Option<Vec<GeneratorEntry>>,
}

#[derive(Debug, Deserialize)]
struct PatchEntry {
  path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratorEntry {
  files: Option<Vec<String>>,
  envs: Option<Vec<String>>,
  env: Option<String>,
}

impl KustomizationManifest {
  /// Plain files read by patches and generators.
  fn inputs(&self) -> Vec<String> {
    let mut inputs = Vec::new();

    // Inline strategic-merge patches are YAML documents, not paths
    for patch in self.patches_strategic_merge.iter().flatten() {
      if !patch.contains('\n') {
        inputs.push(patch.clone());
      }
    }

    inputs.extend(self.patches.iter().flatten().filter_map(|p| p.path.clone()));

    let generators = self.config_map_generator.iter().flatten().chain(self.secret_generator.iter().flatten());
    for generator in generators {
      // `files` entries may be `key=path`
      for file in generator.files.iter().flatten() {
        let path = file.split_once('=').map(|(_, path)| path).unwrap_or(file);
        inputs.push(path.to_string());
      }
      inputs.extend(generator.envs.iter().flatten().cloned());
      inputs.extend(generator.env.iter().cloned());
    }

    inputs
  }
}

/// Parse one kustomization file into a `Unit`.
///
/// The unit's directory is the absolute, normalized parent of `path`.
pub fn parse_kustomization(path: &Path) -> KbcResult<Unit> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

  let manifest: KustomizationManifest = if content.trim().is_empty() {
    KustomizationManifest::default()
  } else {
    serde_yaml::from_str(&content).map_err(|e| {
      KbcError::Discovery(DiscoveryError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })?
  };

  let manifest_path = normalize_path(&std::path::absolute(path)?);
  let directory = manifest_path
    .parent()
    .map(Path::to_path_buf)
    .ok_or_else(|| KbcError::message(format!("Kustomization file has no parent directory: {}", path.display())))?;

  let inputs = manifest.inputs();
  let unit = Unit::new(directory)
    .with_resources(manifest.resources.unwrap_or_default())
    .with_bases(manifest.bases.unwrap_or_default())
    .with_components(manifest.components.unwrap_or_default())
    .with_inputs(inputs);

  Ok(Unit {
    manifest: manifest_path,
    ..unit
  })
}

/// Find and parse every kustomization under `root`.
///
/// Hidden directories (other than `root` itself) and directories named in
/// `exclude` are skipped. A file that fails to parse becomes a warning.
pub fn discover(root: &Path, exclude: &[String]) -> KbcResult<DiscoveryReport> {
  if !root.is_dir() {
    return Err(KbcError::Config(ConfigError::RootNotFound {
      path: root.to_path_buf(),
    }));
  }

  let root = normalize_path(&std::path::absolute(root)?);
  tracing::debug!(root = %root.display(), "Scanning for kustomization files");

  let mut manifests = Vec::new();
  let walker = WalkDir::new(&root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| !is_skipped_dir(entry, exclude));

  for entry in walker {
    let entry = entry?;
    if entry.file_type().is_file() && entry.file_name().to_str().is_some_and(is_kustomization_file) {
      manifests.push(entry.into_path());
    }
  }

  let parsed: Vec<(PathBuf, KbcResult<Unit>)> = manifests
    .par_iter()
    .map(|path| (path.clone(), parse_kustomization(path)))
    .collect();

  let mut by_directory: BTreeMap<PathBuf, Unit> = BTreeMap::new();
  let mut warnings = Vec::new();

  for (path, result) in parsed {
    match result {
      Ok(unit) => {
        if let Some(existing) = by_directory.get(&unit.directory) {
          tracing::warn!(
            kept = %existing.manifest.display(),
            skipped = %path.display(),
            "Multiple kustomization files in one directory"
          );
          warnings.push(DiscoveryError::Parse {
            path,
            reason: format!("another kustomization file already defines {}", unit.directory.display()),
          });
          continue;
        }
        by_directory.insert(unit.directory.clone(), unit);
      }
      Err(err) => {
        tracing::warn!(file = %path.display(), error = %err, "Failed to parse kustomization");
        warnings.push(DiscoveryError::Parse {
          path,
          reason: err.to_string(),
        });
      }
    }
  }

  Ok(DiscoveryReport {
    units: by_directory.into_values().collect(),
    warnings,
  })
}

fn is_skipped_dir(entry: &DirEntry, exclude: &[String]) -> bool {
  if entry.depth() == 0 || !entry.file_type().is_dir() {
    return false;
  }
  let name = entry.file_name().to_string_lossy();
  name.starts_with('.') || exclude.iter().any(|e| e == name.as_ref())
}
