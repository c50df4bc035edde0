//! Shared helpers for library integration tests.

use std::path::PathBuf;

use devbuild_lib::config::DevConfig;
use tempfile::TempDir;

/// Isolated project and cache directories.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("project")).unwrap();
    Self { temp }
  }

  /// Project root.
  pub fn project(&self) -> PathBuf {
    self.temp.path().join("project")
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.project().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn config(&self) -> DevConfig {
    DevConfig {
      builders_dir: self.temp.path().join("builders"),
      functions_dir: self.temp.path().join("functions"),
    }
  }

  /// Install an executable builder script under the builders directory.
  #[cfg(unix)]
  pub fn install_script_builder(&self, id: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = self.config().builders_dir.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    let program = dir.join("build");
    std::fs::write(&program, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
    program
  }
}

/// Sorted keys of a map, as owned strings.
pub fn keys<V>(map: &std::collections::BTreeMap<String, V>) -> Vec<String> {
  map.keys().cloned().collect()
}
