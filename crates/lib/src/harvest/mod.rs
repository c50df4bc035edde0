//! Project file harvesting.
//!
//! Walks the project tree, keeps the files matching a glob pattern and drops
//! everything the project's ignore rules exclude. Ignored directories are
//! pruned during the walk so large trees like `node_modules` are never entered.

mod types;

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;
use walkdir::WalkDir;

use crate::consts::PROJECT_METADATA;
use crate::ignores;

pub use types::*;

/// Harvest the files under `project_root` matching `pattern`.
///
/// `pattern` is a glob over `/`-separated relative paths: `*` stays within a
/// directory, `**` spans directories and `**` alone matches the whole tree.
/// Wildcards match dot files too, except for the project metadata at the root
/// (`.git/` and `.gitignore`), which is never harvested. Ignore rules are
/// resolved fresh for every call.
///
/// Two harvests of an unchanged tree return the same key set.
pub fn harvest(pattern: &str, project_root: &Path) -> Result<ProjectFileSet, HarvestError> {
  let root = dunce::canonicalize(project_root).map_err(|source| HarvestError::FileSystem {
    path: project_root.to_path_buf(),
    source,
  })?;
  fs::read_dir(&root).map_err(|source| HarvestError::FileSystem {
    path: root.clone(),
    source,
  })?;

  let glob = PathPattern::compile(pattern)?;
  let matcher = ignores::resolve(&root)?;

  let walker = WalkDir::new(&root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| {
      if entry.depth() == 0 {
        return true;
      }
      if entry.depth() == 1 && is_project_metadata(entry.file_name()) {
        return false;
      }
      !entry.file_type().is_dir() || !matcher.ignores_dir(&relative_path(&root, entry.path()))
    });

  let mut files = ProjectFileSet::new();

  for entry in walker {
    let entry = entry.map_err(|e| HarvestError::FileSystem {
      path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
      source: e.into(),
    })?;

    if !entry.file_type().is_file() {
      continue;
    }

    let rel = relative_path(&root, entry.path());
    if !glob.is_match(&rel) || matcher.ignores(&rel) {
      continue;
    }

    files.insert(rel.clone(), ProjectFile::new(rel, entry.into_path()));
  }

  debug!(pattern = %pattern, root = %root.display(), count = files.len(), "harvested project files");

  Ok(files)
}

/// Run [`harvest`] on the blocking thread pool.
pub async fn harvest_async(pattern: &str, project_root: &Path) -> Result<ProjectFileSet, HarvestError> {
  let pattern = pattern.to_string();
  let root: PathBuf = project_root.to_path_buf();
  tokio::task::spawn_blocking(move || harvest(&pattern, &root)).await?
}

/// Compiled harvest glob.
struct PathPattern {
  matcher: GlobMatcher,
}

impl PathPattern {
  fn compile(pattern: &str) -> Result<Self, HarvestError> {
    let normalized = pattern.trim_start_matches("./").trim_start_matches('/');
    let matcher = GlobBuilder::new(normalized)
      .literal_separator(true)
      .build()
      .map_err(|source| HarvestError::Pattern {
        pattern: pattern.to_string(),
        source,
      })?
      .compile_matcher();

    Ok(Self { matcher })
  }

  fn is_match(&self, rel: &str) -> bool {
    self.matcher.is_match(rel)
  }
}

fn is_project_metadata(name: &OsStr) -> bool {
  PROJECT_METADATA.iter().any(|entry| name == *entry)
}

fn relative_path(root: &Path, path: &Path) -> String {
  let rel = path.strip_prefix(root).unwrap_or(path);
  rel
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::write_tree;
  use tempfile::TempDir;

  fn keys(files: &ProjectFileSet) -> Vec<&str> {
    files.keys().map(String::as_str).collect()
  }

  #[test]
  fn gitignored_directory_is_excluded() {
    let temp = TempDir::new().unwrap();
    write_tree(
      temp.path(),
      &[
        (".gitignore", "node_modules\n"),
        ("index.js", "module.exports = 1"),
        ("node_modules/x.js", "x"),
      ],
    );

    let files = harvest("**", temp.path()).unwrap();
    assert_eq!(keys(&files), vec!["index.js"]);
  }

  #[test]
  fn dot_files_are_harvested_except_project_metadata() {
    let temp = TempDir::new().unwrap();
    write_tree(
      temp.path(),
      &[
        (".babelrc", "{}"),
        (".env", "A=1"),
        (".git/HEAD", "ref: refs/heads/main"),
        (".gitignore", "*.log\n"),
        (".nowignore", "*.bak\n"),
        (".well-known/security.txt", "s"),
        ("index.js", "i"),
        ("lib/.gitignore", "tmp\n"),
      ],
    );

    assert_eq!(
      keys(&harvest("**", temp.path()).unwrap()),
      vec![".babelrc", ".env", ".well-known/security.txt", "index.js", "lib/.gitignore"]
    );
    assert_eq!(
      keys(&harvest(".well-known/*", temp.path()).unwrap()),
      vec![".well-known/security.txt"]
    );
    assert!(harvest(".gitignore", temp.path()).unwrap().is_empty());
    assert!(harvest(".git/**", temp.path()).unwrap().is_empty());
  }

  #[test]
  fn builtin_exclusions_never_harvested() {
    for ignore_files in [
      vec![],
      vec![(".gitignore", "*.tmp\n")],
      vec![(".nowignore", "*.bak\n")],
      vec![(".gitignore", "*.tmp\n"), (".nowignore", "*.bak\n")],
    ] {
      let temp = TempDir::new().unwrap();
      let mut tree = ignore_files.clone();
      tree.extend([
        (".nowignore", "*.bak\n"),
        ("ncc/bundle.js", "b"),
        ("user/handler.js", "h"),
        ("api/user/[id].js", "u"),
        ("lib/ncc/helper.js", "n"),
        ("index.js", "i"),
      ]);
      write_tree(temp.path(), &tree);

      let files = harvest("**", temp.path()).unwrap();
      assert!(files.contains_key("index.js"));
      assert!(harvest(".nowignore", temp.path()).unwrap().is_empty());
      assert!(!files.contains_key("ncc/bundle.js"));
      assert!(!files.contains_key("user/handler.js"));
      assert!(files.contains_key("api/user/[id].js"));
      assert!(files.contains_key("lib/ncc/helper.js"));
    }
  }

  #[test]
  fn harvest_is_deterministic() {
    let temp = TempDir::new().unwrap();
    write_tree(
      temp.path(),
      &[("b.js", ""), ("a.js", ""), ("lib/c.js", ""), ("lib/nested/d.js", "")],
    );

    let first = harvest("**", temp.path()).unwrap();
    let second = harvest("**", temp.path()).unwrap();
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(keys(&first), vec!["a.js", "b.js", "lib/c.js", "lib/nested/d.js"]);
  }

  #[test]
  fn narrow_pattern_matches_subset() {
    let temp = TempDir::new().unwrap();
    write_tree(
      temp.path(),
      &[("api/a.js", ""), ("api/b.js", ""), ("api/v2/c.js", ""), ("api/readme.md", ""), ("web/d.js", "")],
    );

    let files = harvest("api/**/*.js", temp.path()).unwrap();
    assert_eq!(keys(&files), vec!["api/a.js", "api/b.js", "api/v2/c.js"]);

    let top_level = harvest("api/*.js", temp.path()).unwrap();
    assert_eq!(keys(&top_level), vec!["api/a.js", "api/b.js"]);
  }

  #[test]
  fn leading_dot_slash_is_accepted() {
    let temp = TempDir::new().unwrap();
    write_tree(temp.path(), &[("index.html", "<html></html>")]);

    let files = harvest("./index.html", temp.path()).unwrap();
    assert_eq!(keys(&files), vec!["index.html"]);
  }

  #[test]
  fn files_carry_absolute_paths() {
    let temp = TempDir::new().unwrap();
    write_tree(temp.path(), &[("lib/util.js", "u")]);

    let files = harvest("**", temp.path()).unwrap();
    let file = &files["lib/util.js"];
    assert!(file.path().is_absolute());
    assert!(file.path().ends_with("lib/util.js"));
    assert_eq!(file.relative_path, "lib/util.js");
  }

  #[test]
  fn missing_root_is_filesystem_error() {
    let temp = TempDir::new().unwrap();
    let err = harvest("**", &temp.path().join("missing")).unwrap_err();
    assert!(matches!(err, HarvestError::FileSystem { .. }));
  }

  #[test]
  fn invalid_pattern_is_rejected() {
    let temp = TempDir::new().unwrap();
    let err = harvest("api/[", temp.path()).unwrap_err();
    assert!(matches!(err, HarvestError::Pattern { .. }));
  }

  #[tokio::test]
  async fn harvest_async_matches_sync() {
    let temp = TempDir::new().unwrap();
    write_tree(temp.path(), &[("a.js", "a"), ("b/c.js", "c")]);

    let sync = harvest("**", temp.path()).unwrap();
    let async_files = harvest_async("**", temp.path()).await.unwrap();
    assert_eq!(keys(&sync), keys(&async_files));

    let content = async_files["b/c.js"].read().await.unwrap();
    assert_eq!(content, b"c");
  }
}
