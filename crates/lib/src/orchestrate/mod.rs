//! Build orchestration.
//!
//! A run takes the project's build specs and turns them into one result set:
//!
//! 1. install every builder the specs need, one at a time
//! 2. harvest the whole project once as a shared snapshot
//! 3. build each spec's entrypoints in declaration and discovery order,
//!    merging outputs as they come in (a later output replaces an earlier one
//!    at the same path)
//! 4. materialize the function bundles
//!
//! Any failure aborts the run and nothing built so far is returned.

mod types;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::builder::{BuildRequest, BuildSpec, Builder, BuilderRegistry, StaticBuilder};
use crate::consts::{ALL_FILES_PATTERN, STATIC_BUILDER_ID, SUPPORT_LIBRARY_ID};
use crate::harvest::{self, HarvestError};
use crate::lambda::{self, MaterializeConfig};

pub use types::*;

/// Builder ids that must be installed before `specs` can run.
///
/// Ids are deduplicated and kept in order of first appearance. The static
/// builder is never included; the support library is always appended once.
pub fn required_builders(specs: &[BuildSpec]) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut ids: Vec<String> = specs
    .iter()
    .filter(|spec| !spec.is_static())
    .filter(|spec| seen.insert(spec.builder.as_str()))
    .map(|spec| spec.builder.clone())
    .collect();

  if !seen.contains(SUPPORT_LIBRARY_ID) {
    ids.push(SUPPORT_LIBRARY_ID.to_string());
  }
  ids
}

/// Run every build spec against the project at `project_root`.
///
/// `status` receives a notification at each phase boundary and is set idle on
/// every exit path.
pub async fn run(
  specs: &[BuildSpec],
  project_root: &Path,
  registry: &dyn BuilderRegistry,
  status: &dyn BuildStatus,
  config: &MaterializeConfig,
) -> Result<BuildResultSet, OrchestrateError> {
  let result = run_inner(specs, project_root, registry, status, config).await;
  status.idle();

  match &result {
    Ok(results) => info!(outputs = results.len(), "build run complete"),
    Err(e) => error!(error = %e, "build run failed"),
  }
  result
}

async fn run_inner(
  specs: &[BuildSpec],
  project_root: &Path,
  registry: &dyn BuilderRegistry,
  status: &dyn BuildStatus,
  config: &MaterializeConfig,
) -> Result<BuildResultSet, OrchestrateError> {
  install_builders(specs, registry, status).await?;

  status.busy("Building lambdas");

  let root = dunce::canonicalize(project_root).map_err(|source| HarvestError::FileSystem {
    path: project_root.to_path_buf(),
    source,
  })?;
  let snapshot = Arc::new(harvest::harvest_async(ALL_FILES_PATTERN, &root).await?);
  debug!(files = snapshot.len(), "project snapshot harvested");

  let mut results = BuildResultSet::new();

  for spec in specs {
    let builder: Arc<dyn Builder> = if spec.is_static() {
      Arc::new(StaticBuilder)
    } else {
      registry.lookup(&spec.builder).map_err(OrchestrateError::BuilderNotFound)?
    };

    let entrypoints = harvest::harvest_async(&spec.src, &root).await?;
    info!(
      src = %spec.src,
      builder = %spec.builder,
      entrypoints = entrypoints.len(),
      "building spec"
    );

    for entrypoint in entrypoints.into_keys() {
      let request = BuildRequest {
        files: snapshot.clone(),
        entrypoint,
        work_path: root.clone(),
        config: spec.config.clone().unwrap_or_default(),
        is_dev: true,
      };

      debug!(builder = %spec.builder, entrypoint = %request.entrypoint, "invoking builder");

      let outputs = builder.build(&request).await.map_err(|source| BuildFailure {
        src: spec.src.clone(),
        builder: spec.builder.clone(),
        entrypoint: request.entrypoint.clone(),
        source,
      })?;

      for (path, output) in outputs {
        if results.contains_key(&path) {
          debug!(path = %path, entrypoint = %request.entrypoint, "output replaces earlier output");
        }
        results.insert(path, output);
      }
    }
  }

  lambda::materialize(&mut results, config).await?;

  Ok(results)
}

async fn install_builders(
  specs: &[BuildSpec],
  registry: &dyn BuilderRegistry,
  status: &dyn BuildStatus,
) -> Result<(), OrchestrateError> {
  status.busy("Installing builders");

  for id in required_builders(specs) {
    info!(builder = %id, "installing builder");
    registry
      .ensure_installed(&id)
      .await
      .map_err(|source| OrchestrateError::BuilderInstall { id: id.clone(), source })?;
    info!(builder = %id, "builder installed");
  }

  debug!(static_builder = STATIC_BUILDER_ID, "static builder is built in");
  Ok(())
}
