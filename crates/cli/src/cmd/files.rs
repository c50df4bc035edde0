//! Implementation of the `devbuild files` command.

use std::path::Path;

use anyhow::{Context, Result};

use devbuild_lib::harvest;

use crate::output::{print_info, print_json};

/// List the project files `pattern` selects after ignore rules are applied.
pub fn cmd_files(dir: &Path, pattern: &str, json: bool) -> Result<()> {
  let files = harvest::harvest(pattern, dir).with_context(|| format!("Failed to list files in {}", dir.display()))?;

  if json {
    let paths: Vec<&str> = files.keys().map(String::as_str).collect();
    return print_json(&paths);
  }

  for path in files.keys() {
    println!("{}", path);
  }
  print_info(&format!("{} file(s) match '{}'", files.len(), pattern));

  Ok(())
}
