//! Utility functions for cross-platform path handling

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path into its canonical string form.
///
/// - `.` components are dropped and `..` pops the previous component
/// - repeated and trailing separators disappear
/// - `..` above the root of an absolute path is discarded (`/..` is `/`)
/// - leading `..` of a relative path are kept
/// - an empty result becomes `.`
///
/// Symlinks are never resolved and the filesystem is never touched. On
/// Windows, where paths are case-insensitive, the result is ASCII-lowercased
/// so the same directory always produces the same key.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut out: Vec<Component<'_>> = Vec::new();

  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match out.last() {
        Some(Component::Normal(_)) => {
          out.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => out.push(component),
      },
      other => out.push(other),
    }
  }

  let normalized: PathBuf = if out.is_empty() {
    PathBuf::from(".")
  } else {
    out.iter().collect()
  };

  fold_case(normalized)
}

#[cfg(target_os = "windows")]
fn fold_case(path: PathBuf) -> PathBuf {
  PathBuf::from(path.to_string_lossy().to_ascii_lowercase())
}

#[cfg(not(target_os = "windows"))]
fn fold_case(path: PathBuf) -> PathBuf {
  path
}

/// Resolve a reference declared by a kustomization against its directory.
///
/// Relative references are joined to `base_dir`; absolute ones stay as they
/// are. The result is normalized.
pub fn resolve_reference(base_dir: &Path, reference: &str) -> PathBuf {
  normalize_path(&base_dir.join(reference.trim()))
}

/// Whether a reference looks like a plain file (has a non-empty extension).
///
/// Purely syntactic: `deployment.yaml` is a file, `../base` is not. An
/// extensionless file is misclassified as a directory candidate; it simply
/// fails to resolve to a known kustomization later on.
pub fn has_file_extension(reference: &str) -> bool {
  Path::new(reference.trim())
    .extension()
    .is_some_and(|ext| !ext.is_empty())
}

/// Make `path` absolute by anchoring relative paths to `root`, then normalize.
pub fn anchor_path(root: Option<&Path>, path: &Path) -> PathBuf {
  match root {
    Some(root) if path.is_relative() => normalize_path(&root.join(path)),
    _ => normalize_path(path),
  }
}

/// Convert a path to display format (always forward slashes)
pub fn path_to_display(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
