//! Test utilities for devbuild-lib.
//!
//! Helpers to lay out project trees and package function bundles.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write `(relative path, content)` pairs below `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
  for (name, content) in files {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }
}

/// Package `(name, content, unix mode)` entries into an in-memory zip archive.
pub fn zip_bundle(entries: &[(&str, &str, u32)]) -> Vec<u8> {
  let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
  for (name, content, mode) in entries {
    let options = SimpleFileOptions::default().unix_permissions(*mode);
    writer.start_file(*name, options).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap().into_inner()
}

/// A `provided` runtime bootstrap that echoes its stdin back.
#[cfg(unix)]
pub const ECHO_BOOTSTRAP: &str = "#!/bin/sh\ncat\n";

/// A `provided` runtime bootstrap that prints one environment variable.
#[cfg(unix)]
pub fn env_bootstrap(var: &str) -> String {
  format!("#!/bin/sh\nprintf '%s' \"${}\"\n", var)
}
