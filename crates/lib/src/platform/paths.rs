use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Overrides the directory builder packages are installed in.
pub const BUILDERS_DIR_ENV: &str = "DEVBUILD_BUILDERS_DIR";

/// Overrides the directory function code is extracted into.
pub const FUNCTIONS_DIR_ENV: &str = "DEVBUILD_FUNCTIONS_DIR";

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| std::env::temp_dir())
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| std::env::temp_dir())
}

/// Returns the directory for cache files for the application
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Local"))
    .join(APP_NAME)
    .join("Cache")
}

/// Returns the directory for cache files for the application
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Returns the directory installed builders are resolved from
pub fn builders_dir() -> PathBuf {
  if let Ok(path) = std::env::var(BUILDERS_DIR_ENV) {
    return PathBuf::from(path);
  }
  cache_dir().join("builders")
}

/// Returns the directory local functions are extracted into
pub fn functions_dir() -> PathBuf {
  if let Ok(path) = std::env::var(FUNCTIONS_DIR_ENV) {
    return PathBuf::from(path);
  }
  cache_dir().join("functions")
}
