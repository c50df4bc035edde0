//! Builder installation and lookup.
//!
//! The orchestrator reaches builders only through [`BuilderRegistry`]: every
//! required identifier is installed once up front, then looked up per build
//! spec. [`LocalRegistry`] resolves identifiers against a builders directory:
//!
//! ```text
//! <builders_dir>/
//!   @now/
//!     node/
//!       build          # executable speaking the JSON builder protocol
//!     build-utils/     # library package, no executable
//!   my-builder/
//!     build
//! ```
//!
//! Fetching builder packages from a package registry is not part of this
//! crate; a builder is installable once its directory exists.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::{Builder, ProcessBuilder};
use crate::config::DevConfig;
use crate::consts::SUPPORT_LIBRARY_ID;

/// Name of the builder executable inside a builder directory.
#[cfg(not(windows))]
pub const BUILDER_EXECUTABLE: &str = "build";

/// Name of the builder executable inside a builder directory.
#[cfg(windows)]
pub const BUILDER_EXECUTABLE: &str = "build.exe";

/// Errors from the install/lookup boundary.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// The builder could not be prepared.
  #[error("failed to install builder '{id}': {message}")]
  Install { id: String, message: String },

  /// The builder was never installed, failed to install, or is a library.
  #[error("builder not found: {0}")]
  NotFound(String),
}

/// Install/lookup boundary for builder plugins.
#[async_trait]
pub trait BuilderRegistry: Send + Sync {
  /// Prepare a builder. Installing an already installed builder is a no-op.
  async fn ensure_installed(&self, id: &str) -> Result<(), RegistryError>;

  /// Return a ready-to-invoke handle for an installed builder.
  fn lookup(&self, id: &str) -> Result<Arc<dyn Builder>, RegistryError>;
}

#[derive(Clone)]
enum Installed {
  Builder(Arc<dyn Builder>),
  Library,
}

/// Registry backed by a directory of installed builder packages.
///
/// In-process builders can be added with [`register`](Self::register); they
/// still have to go through [`ensure_installed`](BuilderRegistry::ensure_installed)
/// before they can be looked up.
pub struct LocalRegistry {
  builders_dir: PathBuf,
  available: RwLock<HashMap<String, Arc<dyn Builder>>>,
  installed: RwLock<HashMap<String, Installed>>,
}

impl std::fmt::Debug for LocalRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let installed = self.installed.read().unwrap_or_else(|e| e.into_inner());
    let mut ids: Vec<_> = installed.keys().collect();
    ids.sort();
    f.debug_struct("LocalRegistry")
      .field("builders_dir", &self.builders_dir)
      .field("installed", &ids)
      .finish()
  }
}

impl LocalRegistry {
  /// Create a registry rooted at `builders_dir`.
  ///
  /// The support library is bundled with this crate and starts out installed.
  pub fn new(builders_dir: impl Into<PathBuf>) -> Self {
    let mut installed = HashMap::new();
    installed.insert(SUPPORT_LIBRARY_ID.to_string(), Installed::Library);

    Self {
      builders_dir: builders_dir.into(),
      available: RwLock::new(HashMap::new()),
      installed: RwLock::new(installed),
    }
  }

  pub fn from_config(config: &DevConfig) -> Self {
    Self::new(&config.builders_dir)
  }

  pub fn builders_dir(&self) -> &Path {
    &self.builders_dir
  }

  /// Make an in-process builder available under `id`.
  pub fn register(&self, id: impl Into<String>, builder: Arc<dyn Builder>) {
    let mut available = self.available.write().unwrap_or_else(|e| e.into_inner());
    available.insert(id.into(), builder);
  }

  pub fn is_installed(&self, id: &str) -> bool {
    let installed = self.installed.read().unwrap_or_else(|e| e.into_inner());
    installed.contains_key(id)
  }

  /// Directory a builder package is expected in.
  ///
  /// Scoped ids keep their scope as a directory: `@now/node` -> `<dir>/@now/node`.
  pub fn builder_dir(&self, id: &str) -> Result<PathBuf, RegistryError> {
    let relative = Path::new(id);
    let valid = !id.is_empty() && relative.components().all(|c| matches!(c, Component::Normal(_)));
    if !valid {
      return Err(RegistryError::Install {
        id: id.to_string(),
        message: "invalid builder identifier".to_string(),
      });
    }
    Ok(self.builders_dir.join(relative))
  }

  async fn resolve(&self, id: &str) -> Result<Installed, RegistryError> {
    let available = {
      let available = self.available.read().unwrap_or_else(|e| e.into_inner());
      available.get(id).cloned()
    };
    if let Some(builder) = available {
      return Ok(Installed::Builder(builder));
    }

    let dir = self.builder_dir(id)?;
    let metadata = tokio::fs::metadata(&dir).await.map_err(|e| RegistryError::Install {
      id: id.to_string(),
      message: format!("{} is not available: {}", dir.display(), e),
    })?;
    if !metadata.is_dir() {
      return Err(RegistryError::Install {
        id: id.to_string(),
        message: format!("{} is not a directory", dir.display()),
      });
    }

    let program = dir.join(BUILDER_EXECUTABLE);
    match tokio::fs::metadata(&program).await {
      Ok(meta) if meta.is_file() && is_executable(&meta) => {
        debug!(builder = %id, program = %program.display(), "resolved builder executable");
        Ok(Installed::Builder(Arc::new(ProcessBuilder::new(id, program))))
      }
      Ok(meta) if meta.is_file() => Err(RegistryError::Install {
        id: id.to_string(),
        message: format!("{} is not executable", program.display()),
      }),
      _ => {
        debug!(builder = %id, dir = %dir.display(), "no executable, installing as library");
        Ok(Installed::Library)
      }
    }
  }
}

#[async_trait]
impl BuilderRegistry for LocalRegistry {
  async fn ensure_installed(&self, id: &str) -> Result<(), RegistryError> {
    if self.is_installed(id) {
      debug!(builder = %id, "builder already installed");
      return Ok(());
    }

    let resolved = self.resolve(id).await?;

    let mut installed = self.installed.write().unwrap_or_else(|e| e.into_inner());
    installed.entry(id.to_string()).or_insert(resolved);
    info!(builder = %id, "builder ready");
    Ok(())
  }

  fn lookup(&self, id: &str) -> Result<Arc<dyn Builder>, RegistryError> {
    let installed = self.installed.read().unwrap_or_else(|e| e.into_inner());
    match installed.get(id) {
      Some(Installed::Builder(builder)) => Ok(builder.clone()),
      Some(Installed::Library) | None => Err(RegistryError::NotFound(id.to_string())),
    }
  }
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
  use std::os::unix::fs::PermissionsExt;
  meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
  true
}
