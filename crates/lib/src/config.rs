//! Runtime configuration.
//!
//! Directories default to locations under the user cache directory and can be
//! overridden with `DEVBUILD_BUILDERS_DIR` and `DEVBUILD_FUNCTIONS_DIR`.

use std::path::PathBuf;

use crate::lambda::MaterializeConfig;
use crate::platform::paths;

/// Configuration for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevConfig {
  /// Directory installed builder packages are resolved from.
  pub builders_dir: PathBuf,
  /// Directory local function code is extracted into.
  pub functions_dir: PathBuf,
}

impl DevConfig {
  /// Read the configuration from the environment.
  pub fn from_env() -> Self {
    Self {
      builders_dir: paths::builders_dir(),
      functions_dir: paths::functions_dir(),
    }
  }

  pub fn materialize(&self) -> MaterializeConfig {
    MaterializeConfig {
      functions_dir: self.functions_dir.clone(),
    }
  }
}

impl Default for DevConfig {
  fn default() -> Self {
    Self::from_env()
  }
}
