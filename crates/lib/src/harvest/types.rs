//! Types produced by project harvesting.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::ignores::IgnoreError;

/// A file found in the project tree.
///
/// On the builder wire a project file is a filesystem reference:
/// `{ "type": "FileFsRef", "fsPath": "/abs/path" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "FileFsRef")]
pub struct ProjectFile {
  /// Path relative to the project root, always `/`-separated.
  #[serde(skip)]
  pub relative_path: String,
  /// Absolute path on disk.
  #[serde(rename = "fsPath")]
  pub absolute_path: PathBuf,
}

impl ProjectFile {
  pub fn new(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
    Self {
      relative_path: relative_path.into(),
      absolute_path: absolute_path.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.absolute_path
  }

  /// Read the current file contents.
  pub async fn read(&self) -> std::io::Result<Vec<u8>> {
    tokio::fs::read(&self.absolute_path).await
  }
}

/// Harvested files keyed by relative path.
///
/// Iteration order is sorted path order, which is also the order entrypoints
/// are built in.
pub type ProjectFileSet = BTreeMap<String, ProjectFile>;

/// Errors that can occur while harvesting a project.
#[derive(Debug, Error)]
pub enum HarvestError {
  /// The project root or an entry below it could not be read.
  #[error("failed to read '{path}': {source}")]
  FileSystem {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Ignore rules could not be loaded.
  #[error(transparent)]
  Ignore(#[from] IgnoreError),

  /// The glob pattern is invalid.
  #[error("invalid pattern '{pattern}': {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: globset::Error,
  },

  /// The blocking harvest task did not complete.
  #[error("harvest task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}
