use std::sync::Arc;

use async_trait::async_trait;
use devbuild_lib::builder::{
  BuildOutput, BuildOutputs, BuildRequest, Builder, BuilderError, FileRef, LocalRegistry, StaticAsset,
};
use devbuild_lib::consts::SUPPORT_LIBRARY_ID;
use devbuild_lib::manifest::ProjectManifest;
use devbuild_lib::orchestrate::{self, NoStatus, OrchestrateError, TracingStatus};

use super::common::{TestEnv, keys};

/// Renders markdown entrypoints to `.html` outputs by upper-casing them.
struct ShoutBuilder;

#[async_trait]
impl Builder for ShoutBuilder {
  async fn build(&self, request: &BuildRequest) -> Result<BuildOutputs, BuilderError> {
    let file = request
      .files
      .get(&request.entrypoint)
      .ok_or_else(|| BuilderError::other(format!("{} not in snapshot", request.entrypoint)))?;
    let source = String::from_utf8_lossy(&file.read().await?).to_uppercase();

    let mut outputs = BuildOutputs::new();
    outputs.insert(
      request.entrypoint.replace(".md", ".html"),
      BuildOutput::StaticAsset(StaticAsset::blob(source)),
    );
    Ok(outputs)
  }
}

#[tokio::test]
async fn manifest_builds_run_against_local_registry() {
  let env = TestEnv::new();
  env.write_file(
    "now.json",
    r#"{
      "version": 2,
      "builds": [
        { "src": "*.md", "use": "@acme/shout" },
        { "src": "public/**", "use": "@now/static" }
      ]
    }"#,
  );
  env.write_file("about.md", "about us");
  env.write_file("index.md", "hello");
  env.write_file("public/logo.svg", "<svg/>");
  env.write_file("ncc/index.js", "");

  let registry = LocalRegistry::from_config(&env.config());
  registry.register("@acme/shout", Arc::new(ShoutBuilder));

  let specs = ProjectManifest::load(&env.project()).unwrap().build_specs();
  let results = orchestrate::run(
    &specs,
    &env.project(),
    &registry,
    &TracingStatus,
    &env.config().materialize(),
  )
  .await
  .unwrap();

  assert_eq!(keys(&results), vec!["about.html", "index.html", "public/logo.svg"]);
  match &results["index.html"].as_static().unwrap().content {
    FileRef::Blob(data) => assert_eq!(data, b"HELLO"),
    FileRef::Fs(path) => panic!("unexpected file reference {}", path.display()),
  }
  assert!(matches!(
    results["public/logo.svg"].as_static().map(|a| &a.content),
    Some(FileRef::Fs(path)) if path.ends_with("public/logo.svg")
  ));
  assert!(registry.is_installed("@acme/shout"));
  assert!(registry.is_installed(SUPPORT_LIBRARY_ID));
}

#[tokio::test]
async fn project_without_manifest_is_served_statically() {
  let env = TestEnv::new();
  env.write_file("index.html", "<h1>hi</h1>");
  env.write_file(".gitignore", "*.tmp\n");
  env.write_file("scratch.tmp", "");

  let registry = LocalRegistry::from_config(&env.config());
  let specs = ProjectManifest::load(&env.project()).unwrap().build_specs();
  let results = orchestrate::run(&specs, &env.project(), &registry, &NoStatus, &env.config().materialize())
    .await
    .unwrap();

  assert_eq!(keys(&results), vec!["index.html"]);
}

#[tokio::test]
async fn uninstallable_builder_fails_the_run() {
  let env = TestEnv::new();
  env.write_file(
    "now.json",
    r#"{ "builds": [{ "src": "api/*.js", "use": "@now/node" }] }"#,
  );
  env.write_file("api/a.js", "");

  let registry = LocalRegistry::from_config(&env.config());
  let specs = ProjectManifest::load(&env.project()).unwrap().build_specs();
  let err = orchestrate::run(&specs, &env.project(), &registry, &NoStatus, &env.config().materialize())
    .await
    .unwrap_err();

  assert!(matches!(err, OrchestrateError::BuilderInstall { ref id, .. } if id == "@now/node"));
}

#[cfg(unix)]
mod process {
  use super::*;
  use devbuild_lib::builder::BuildSpec;
  use devbuild_lib::consts::{DEV_REGION, REGION_ENV_VAR};

  /// Zip archive holding an executable `bootstrap` that echoes stdin.
  const ECHO_FUNCTION_ZIP: &str = "UEsDBBQAAAAAAAAAIVCEK9lNDgAAAA4AAAAJAAAAYm9vdHN0cmFwIyEvYmluL3NoCmNhdApQSwECFAMUAAAAAAAAACFQhCvZTQ4AAAAOAAAACQAAAAAAAAAAAAAA7YEAAAAAYm9vdHN0cmFwUEsFBgAAAAABAAEANwAAADUAAAAAAA==";

  #[tokio::test]
  async fn process_builder_produces_invokable_function() {
    let env = TestEnv::new();
    env.write_file("api/echo.sh", "");
    env.install_script_builder(
      "@acme/echo",
      &format!(
        "cat > /dev/null\nprintf '{{\"api/echo\":{{\"type\":\"Lambda\",\"zipBuffer\":\"{}\",\"handler\":\"bootstrap\",\"runtime\":\"provided\",\"environment\":{{\"GREETING\":\"hi\"}}}}}}'\n",
        ECHO_FUNCTION_ZIP
      ),
    );

    let registry = LocalRegistry::from_config(&env.config());
    let specs = vec![BuildSpec::new("api/*.sh", "@acme/echo")];
    let results = orchestrate::run(&specs, &env.project(), &registry, &NoStatus, &env.config().materialize())
      .await
      .unwrap();

    let bundle = results["api/echo"].as_lambda().unwrap();
    let function = bundle.function.as_ref().expect("function materialized");
    assert_eq!(function.runtime(), "provided");
    assert_eq!(function.environment()["GREETING"], "hi");
    assert_eq!(function.environment()[REGION_ENV_VAR], DEV_REGION);
    assert!(function.code_dir().starts_with(&env.config().functions_dir));

    let event = serde_json::json!({ "path": "/api/echo", "method": "GET" });
    let output = function.invoke(&event).await.unwrap();
    assert_eq!(output.json().unwrap(), event);
  }

  #[tokio::test]
  async fn failing_process_builder_names_the_entrypoint() {
    let env = TestEnv::new();
    env.write_file("api/a.js", "");
    env.write_file("api/b.js", "");
    env.install_script_builder("@acme/broken", "cat > /dev/null\necho 'cannot compile' >&2\nexit 2\n");

    let registry = LocalRegistry::from_config(&env.config());
    let specs = vec![BuildSpec::new("api/*.js", "@acme/broken")];
    let err = orchestrate::run(&specs, &env.project(), &registry, &NoStatus, &env.config().materialize())
      .await
      .unwrap_err();

    match err {
      OrchestrateError::Build(failure) => {
        assert_eq!(failure.builder, "@acme/broken");
        assert_eq!(failure.entrypoint, "api/a.js");
        assert!(matches!(
          failure.source,
          BuilderError::Failed { code: Some(2), ref stderr } if stderr == "cannot compile"
        ));
      }
      other => panic!("unexpected error: {other}"),
    }
  }
}
