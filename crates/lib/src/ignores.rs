//! Project ignore rules.
//!
//! Builds an [`IgnoreMatcher`] from the project's `.gitignore`, its `.nowignore`
//! and the built-in exclusions. Each source is compiled on its own and the
//! results are unioned: a path ignored by any source stays ignored, and a
//! negated pattern (`!foo`) only re-includes paths within its own file.
//!
//! Matchers are cheap to rebuild and hold no shared state, so every harvest
//! resolves a fresh one and edits to ignore files are picked up on the next run.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use thiserror::Error;
use tracing::debug;

use crate::consts::{BUILTIN_EXCLUSIONS, DEPLOY_IGNORE_FILE, GIT_IGNORE_FILE};

/// Errors that can occur while resolving ignore rules.
#[derive(Debug, Error)]
pub enum IgnoreError {
  /// The ignore file exists but could not be read.
  #[error("failed to read ignore file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A pattern could not be compiled.
  #[error("invalid pattern in {origin}: {source}")]
  Pattern {
    origin: String,
    #[source]
    source: ignore::Error,
  },
}

/// Compiled predicate deciding whether a project-relative path is excluded.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
  root: PathBuf,
  sources: Vec<Gitignore>,
}

impl IgnoreMatcher {
  /// Returns true if the file at `path` (relative to the project root) is ignored.
  ///
  /// A file is also ignored when any of its parent directories is.
  pub fn ignores(&self, path: &str) -> bool {
    self.matches(path, false)
  }

  /// Same as [`ignores`](Self::ignores) for a directory path, so that
  /// directory-only patterns like `build/` apply.
  pub fn ignores_dir(&self, path: &str) -> bool {
    self.matches(path, true)
  }

  fn matches(&self, path: &str, is_dir: bool) -> bool {
    let path = Path::new(path);
    let relative = if path.has_root() {
      match path.strip_prefix(&self.root) {
        Ok(rel) => rel,
        Err(_) => return false,
      }
    } else {
      path
    };

    let relative = relative.strip_prefix("./").unwrap_or(relative);
    if relative.as_os_str().is_empty() {
      return false;
    }

    self
      .sources
      .iter()
      .any(|source| source.matched_path_or_any_parents(relative, is_dir).is_ignore())
  }
}

/// Resolve the ignore rules for a project.
///
/// Reads `.gitignore` and `.nowignore` from `project_root` when they exist and
/// always appends the built-in exclusions. Missing ignore files are not an
/// error; an ignore file that exists but cannot be read is.
pub fn resolve(project_root: &Path) -> Result<IgnoreMatcher, IgnoreError> {
  let mut sources = Vec::with_capacity(3);

  for name in [GIT_IGNORE_FILE, DEPLOY_IGNORE_FILE] {
    let path = project_root.join(name);
    if !path.exists() {
      continue;
    }

    let content = fs::read_to_string(&path).map_err(|source| IgnoreError::Read {
      path: path.clone(),
      source,
    })?;
    debug!(file = %path.display(), "loaded ignore file");

    sources.push(compile(project_root, name, Some(&path), content.lines())?);
  }

  sources.push(compile(
    project_root,
    "built-in exclusions",
    None,
    BUILTIN_EXCLUSIONS.iter().copied(),
  )?);

  Ok(IgnoreMatcher {
    root: project_root.to_path_buf(),
    sources,
  })
}

fn compile<'a>(
  root: &Path,
  origin: &str,
  from: Option<&Path>,
  lines: impl Iterator<Item = &'a str>,
) -> Result<Gitignore, IgnoreError> {
  let pattern_err = |source| IgnoreError::Pattern {
    origin: origin.to_string(),
    source,
  };

  let mut builder = GitignoreBuilder::new(root);
  for line in lines {
    builder
      .add_line(from.map(Path::to_path_buf), line)
      .map_err(pattern_err)?;
  }
  builder.build().map_err(pattern_err)
}
