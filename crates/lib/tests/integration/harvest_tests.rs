use devbuild_lib::harvest::{self, HarvestError};
use devbuild_lib::manifest::ProjectManifest;

use super::common::{TestEnv, keys};

#[test]
fn gitignored_directories_are_not_harvested() {
  let env = TestEnv::new();
  env.write_file(".gitignore", "node_modules\n");
  env.write_file("index.js", "module.exports = 1");
  env.write_file("node_modules/x.js", "");

  let files = harvest::harvest("**", &env.project()).unwrap();
  assert_eq!(keys(&files), vec!["index.js"]);
}

#[test]
fn builtin_exclusions_apply_for_every_ignore_file_combination() {
  let combos: [&[(&str, &str)]; 4] = [
    &[],
    &[(".gitignore", "*.log\n")],
    &[(".nowignore", "secret.txt\n")],
    &[(".gitignore", "*.log\n"), (".nowignore", "secret.txt\n")],
  ];

  for ignore_files in combos {
    let env = TestEnv::new();
    for (name, content) in ignore_files {
      env.write_file(name, content);
    }
    env.write_file("index.html", "");
    env.write_file("ncc/index.js", "");
    env.write_file("user/handler.js", "");
    env.write_file("api/user/handler.js", "");

    let files = harvest::harvest("**", &env.project()).unwrap();
    assert_eq!(
      keys(&files),
      vec!["api/user/handler.js", "index.html"],
      "ignore files: {:?}",
      ignore_files
    );

    let dotted = harvest::harvest(".nowignore", &env.project()).unwrap();
    assert!(dotted.is_empty(), "ignore files: {:?}", ignore_files);
  }
}

#[test]
fn only_root_level_builder_directories_are_excluded() {
  let env = TestEnv::new();
  env.write_file("user/session.js", "");
  env.write_file("ncc/index.js", "");
  env.write_file("api/user/[id].js", "");
  env.write_file("api/users.js", "");
  env.write_file("lib/ncc/helper.js", "");

  let files = harvest::harvest("**", &env.project()).unwrap();
  assert_eq!(keys(&files), vec!["api/user/[id].js", "api/users.js", "lib/ncc/helper.js"]);

  let entrypoints = harvest::harvest("api/**/*.js", &env.project()).unwrap();
  assert_eq!(keys(&entrypoints), vec!["api/user/[id].js", "api/users.js"]);
}

#[test]
fn nowignore_and_gitignore_are_unioned() {
  let env = TestEnv::new();
  env.write_file(".gitignore", "*.log\n");
  env.write_file(".nowignore", "drafts/\n");
  env.write_file("debug.log", "");
  env.write_file("drafts/post.md", "");
  env.write_file("posts/hello.md", "");

  let files = harvest::harvest("**", &env.project()).unwrap();
  assert_eq!(keys(&files), vec!["posts/hello.md"]);
}

#[test]
fn harvest_is_repeatable() {
  let env = TestEnv::new();
  env.write_file(".gitignore", "dist\n");
  for name in ["b.js", "a.js", "lib/z.js", "lib/y/x.js", "dist/out.js"] {
    env.write_file(name, "");
  }

  let first = harvest::harvest("**", &env.project()).unwrap();
  let second = harvest::harvest("**", &env.project()).unwrap();
  assert_eq!(keys(&first), keys(&second));
  assert_eq!(keys(&first), vec!["a.js", "b.js", "lib/y/x.js", "lib/z.js"]);
}

#[test]
fn files_point_at_the_project() {
  let env = TestEnv::new();
  env.write_file("api/a.js", "a");

  let files = harvest::harvest("api/*.js", &env.project()).unwrap();
  let file = &files["api/a.js"];
  assert_eq!(file.relative_path, "api/a.js");
  assert!(file.path().is_absolute());
  assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "a");
}

#[test]
fn missing_project_is_file_system_error() {
  let env = TestEnv::new();
  let err = harvest::harvest("**", &env.temp.path().join("nope")).unwrap_err();
  assert!(matches!(err, HarvestError::FileSystem { .. }));
}

#[test]
fn manifest_specs_drive_harvest_patterns() {
  let env = TestEnv::new();
  env.write_file(
    "now.json",
    r#"{ "builds": [{ "src": "api/**/*.js", "use": "@now/node" }] }"#,
  );
  env.write_file("api/a.js", "");
  env.write_file("api/nested/b.js", "");
  env.write_file("index.html", "");

  let specs = ProjectManifest::load(&env.project()).unwrap().build_specs();
  let files = harvest::harvest(&specs[0].src, &env.project()).unwrap();
  assert_eq!(keys(&files), vec!["api/a.js", "api/nested/b.js"]);
}
