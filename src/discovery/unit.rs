//! Parsed representation of one kustomization

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// File names kustomize recognizes as a kustomization definition.
pub const KUSTOMIZATION_FILE_NAMES: [&str; 3] = ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Check if a file name is a kustomization file
pub fn is_kustomization_file(name: &str) -> bool {
  KUSTOMIZATION_FILE_NAMES.contains(&name)
}

/// Which field of the kustomization declared a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
  /// `resources:` (files and directories mixed)
  Resource,
  /// `bases:` (deprecated)
  Base,
  /// `components:`
  Component,
}

impl fmt::Display for ReferenceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReferenceKind::Resource => write!(f, "resources"),
      ReferenceKind::Base => write!(f, "bases"),
      ReferenceKind::Component => write!(f, "components"),
    }
  }
}

/// One kustomization, identified by its directory.
///
/// Immutable once discovery hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
  /// Canonical absolute directory holding the kustomization file
  pub directory: PathBuf,
  /// The kustomization file itself
  pub manifest: PathBuf,
  pub resources: Vec<String>,
  pub bases: Vec<String>,
  pub components: Vec<String>,
  /// Plain files consumed by patches and generators
  pub inputs: Vec<String>,
}

impl Unit {
  /// A unit with no declarations, rooted at `directory`.
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    let directory = directory.into();
    let manifest = directory.join(KUSTOMIZATION_FILE_NAMES[0]);
    Self {
      directory,
      manifest,
      resources: Vec::new(),
      bases: Vec::new(),
      components: Vec::new(),
      inputs: Vec::new(),
    }
  }

  pub fn with_resources<I, S>(mut self, resources: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.resources = resources.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_bases<I, S>(mut self, bases: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.bases = bases.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_components<I, S>(mut self, components: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.components = components.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.inputs = inputs.into_iter().map(Into::into).collect();
    self
  }

  /// All declared references: resources, then bases, then components.
  pub fn references(&self) -> impl Iterator<Item = (ReferenceKind, &str)> {
    let resources = self.resources.iter().map(|r| (ReferenceKind::Resource, r.as_str()));
    let bases = self.bases.iter().map(|r| (ReferenceKind::Base, r.as_str()));
    let components = self.components.iter().map(|r| (ReferenceKind::Component, r.as_str()));
    resources.chain(bases).chain(components)
  }

  /// Everything a changed file can match against: references plus inputs.
  pub fn watched_paths(&self) -> impl Iterator<Item = &str> {
    self
      .references()
      .map(|(_, reference)| reference)
      .chain(self.inputs.iter().map(String::as_str))
  }
}
