/// Application name used for config and cache directories.
pub const APP_NAME: &str = "devbuild";

/// Builder id that serves matched files as-is. It is never installed.
pub const STATIC_BUILDER_ID: &str = "@now/static";

/// Support library installed unconditionally before any build runs.
pub const SUPPORT_LIBRARY_ID: &str = "@now/build-utils";

/// Version-control ignore file read from the project root.
pub const GIT_IGNORE_FILE: &str = ".gitignore";

/// Deployment ignore file read from the project root.
pub const DEPLOY_IGNORE_FILE: &str = ".nowignore";

/// Patterns excluded from every harvest regardless of project ignore files.
///
/// `ncc/` and `user/` are intermediate directories written by builders into
/// the project root. Every entry is anchored, so a nested `api/user/` is kept.
pub const BUILTIN_EXCLUSIONS: &[&str] = &["/.nowignore", "/ncc/", "/user/"];

/// Root entries that are project metadata rather than deployable files.
pub const PROJECT_METADATA: &[&str] = &[".git", GIT_IGNORE_FILE];

/// Project manifest declaring the build specs.
pub const MANIFEST_FILE: &str = "now.json";

/// Synthetic variable injected into every local function environment.
pub const REGION_ENV_VAR: &str = "NOW_REGION";

/// Region reported to functions running locally.
pub const DEV_REGION: &str = "dev1";

/// Glob matching the entire project tree.
pub const ALL_FILES_PATTERN: &str = "**";
