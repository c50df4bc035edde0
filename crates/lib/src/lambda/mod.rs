//! Function bundle materialization.
//!
//! After every builder has run, each [`LambdaBundle`] in the result set is
//! turned into a [`LocalFunction`]: its code archive is extracted to disk, its
//! runtime resolved to a launcher and its environment merged with the local
//! region variable. Bundles are independent of each other, so they are all
//! materialized at once and the call returns when the slowest one settles.
//!
//! # Submodules
//!
//! - [`function`] - extracted functions and local invocation
//! - [`runtime`] - runtime identifier to launcher mapping

pub mod function;
pub mod runtime;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info};

use crate::builder::{BuildOutput, LambdaBundle};
use crate::orchestrate::BuildResultSet;
use crate::platform::paths;

pub use function::{FunctionDefinition, InvokeError, InvokeOutput, LocalFunction};
pub use runtime::Launcher;

/// Errors that can occur while materializing functions.
#[derive(Debug, Error)]
pub enum MaterializeError {
  /// The functions directory could not be created.
  #[error("failed to create function directory in '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The code archive is not a valid zip file.
  #[error("invalid code archive for {name}: {source}")]
  Archive {
    name: String,
    #[source]
    source: zip::result::ZipError,
  },

  /// The code archive could not be written to disk.
  #[error("failed to extract code for {name}: {source}")]
  Extract {
    name: String,
    #[source]
    source: std::io::Error,
  },

  /// The runtime cannot run locally.
  #[error("unsupported runtime '{runtime}' for {name}")]
  UnsupportedRuntime { name: String, runtime: String },

  /// The runtime's executable is not a plain file name inside the code archive.
  #[error("invalid executable '{}' for {name}", path.display())]
  InvalidExecutable { name: String, path: PathBuf },

  /// The runtime's executable is not part of the code archive.
  #[error("code archive for {name} has no executable '{}'", path.display())]
  MissingExecutable { name: String, path: PathBuf },

  /// The materialization task for a function panicked or was cancelled.
  #[error("materialization task for {name} failed: {source}")]
  Panicked {
    name: String,
    #[source]
    source: JoinError,
  },

  /// At least one function failed; no function was attached.
  #[error("{failed} of {total} functions failed to materialize: {source}")]
  Failed {
    failed: usize,
    total: usize,
    #[source]
    source: Box<MaterializeError>,
  },
}

/// Configuration for materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeConfig {
  /// Directory function code is extracted into.
  pub functions_dir: PathBuf,
}

impl Default for MaterializeConfig {
  fn default() -> Self {
    Self {
      functions_dir: paths::functions_dir(),
    }
  }
}

/// Materialize every function bundle in `results`.
///
/// Each bundle that has no function yet gets one attached in place; static
/// assets are left alone. If any bundle fails, the whole call fails and none
/// of the functions created by this call are attached.
///
/// Returns the number of functions created.
pub async fn materialize(results: &mut BuildResultSet, config: &MaterializeConfig) -> Result<usize, MaterializeError> {
  let definitions: Vec<FunctionDefinition> = results
    .iter()
    .filter_map(|(path, output)| match output {
      BuildOutput::Lambda(bundle) if !bundle.is_materialized() => Some(FunctionDefinition::from_bundle(path, bundle)),
      BuildOutput::Lambda(_) | BuildOutput::StaticAsset(_) => None,
    })
    .collect();

  let total = definitions.len();
  if total == 0 {
    debug!("no functions to materialize");
    return Ok(0);
  }

  info!(count = total, "materializing functions");

  let mut join_set = JoinSet::new();
  let mut names = HashMap::with_capacity(total);
  for definition in definitions {
    let functions_dir = config.functions_dir.clone();
    let name = definition.name.clone();
    let handle = join_set.spawn_blocking(move || LocalFunction::create(definition, &functions_dir));
    names.insert(handle.id(), name);
  }

  let (created, failures) = settle(join_set, names).await;

  let failed = failures.len();
  if let Some(first) = failures.into_iter().next() {
    return Err(MaterializeError::Failed {
      failed,
      total,
      source: Box::new(first),
    });
  }

  for (name, function) in created {
    if let Some(BuildOutput::Lambda(bundle)) = results.get_mut(&name) {
      attach(bundle, function);
    }
  }

  info!(count = total, "functions ready");
  Ok(total)
}

/// Wait for every task and pair each outcome with the function name it was
/// spawned for.
async fn settle<T: 'static>(
  mut join_set: JoinSet<Result<T, MaterializeError>>,
  mut names: HashMap<task::Id, String>,
) -> (Vec<(String, T)>, Vec<MaterializeError>) {
  let mut created = Vec::with_capacity(names.len());
  let mut failures = Vec::new();

  while let Some(joined) = join_set.join_next_with_id().await {
    match joined {
      Ok((id, Ok(function))) => {
        let name = names.remove(&id).unwrap_or_default();
        debug!(function = %name, "function materialized");
        created.push((name, function));
      }
      Ok((id, Err(e))) => {
        let name = names.remove(&id).unwrap_or_default();
        error!(function = %name, error = %e, "function materialization failed");
        failures.push(e);
      }
      Err(e) => {
        let name = names.remove(&e.id()).unwrap_or_default();
        error!(function = %name, error = %e, "materialization task panicked");
        failures.push(MaterializeError::Panicked { name, source: e });
      }
    }
  }

  (created, failures)
}

fn attach(bundle: &mut LambdaBundle, function: LocalFunction) {
  bundle.function = Some(Arc::new(function));
}
