//! Project manifest.
//!
//! Build specs are declared in `now.json` at the project root:
//!
//! ```json
//! {
//!   "version": 2,
//!   "builds": [
//!     { "src": "api/**/*.js", "use": "@now/node" },
//!     { "src": "public/**", "use": "@now/static" }
//!   ]
//! }
//! ```
//!
//! A project without a manifest, or whose manifest has no `builds`, is served
//! as static files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::builder::BuildSpec;
use crate::consts::{ALL_FILES_PATTERN, MANIFEST_FILE, STATIC_BUILDER_ID};

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid manifest '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// The parts of `now.json` this crate reads.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub builds: Option<Vec<BuildSpec>>,
}

impl ProjectManifest {
  /// Load the manifest from `project_root`.
  ///
  /// A missing manifest file is treated as an empty manifest.
  pub fn load(project_root: &Path) -> Result<Self, ManifestError> {
    let path = project_root.join(MANIFEST_FILE);

    let content = match std::fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no manifest, using defaults");
        return Ok(Self::default());
      }
      Err(source) => return Err(ManifestError::Read { path, source }),
    };

    serde_json::from_str(&content).map_err(|source| ManifestError::Parse { path, source })
  }

  /// The declared build specs, or a single static spec over the whole tree.
  pub fn build_specs(&self) -> Vec<BuildSpec> {
    match &self.builds {
      Some(builds) => builds.clone(),
      None => vec![BuildSpec::new(ALL_FILES_PATTERN, STATIC_BUILDER_ID)],
    }
  }
}
