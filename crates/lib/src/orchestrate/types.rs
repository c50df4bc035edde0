//! Types shared by the orchestrator and its callers.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::info;

use crate::builder::{BuildOutput, BuilderError, RegistryError};
use crate::harvest::HarvestError;
use crate::lambda::MaterializeError;

/// Outputs of a whole run, keyed by output path.
pub type BuildResultSet = BTreeMap<String, BuildOutput>;

/// A builder invocation failed for one entrypoint.
#[derive(Debug, Error)]
#[error("builder '{builder}' failed on {entrypoint} (src \"{src}\"): {source}")]
pub struct BuildFailure {
  /// Source pattern of the spec in progress.
  pub src: String,
  /// Builder identifier of the spec in progress.
  pub builder: String,
  /// Entrypoint being built, relative to the project root.
  pub entrypoint: String,
  #[source]
  pub source: BuilderError,
}

/// Errors that abort an orchestration run.
///
/// A run never returns partial results: on any of these, everything built so
/// far is discarded.
#[derive(Debug, Error)]
pub enum OrchestrateError {
  /// A required builder could not be installed.
  #[error("failed to install builder '{id}': {source}")]
  BuilderInstall {
    id: String,
    #[source]
    source: RegistryError,
  },

  /// A builder was not available when a spec needed it.
  #[error(transparent)]
  BuilderNotFound(RegistryError),

  /// The project tree could not be harvested.
  #[error("failed to harvest project files: {0}")]
  Harvest(#[from] HarvestError),

  /// A builder failed on an entrypoint.
  #[error(transparent)]
  Build(#[from] BuildFailure),

  /// Function bundles could not be materialized.
  #[error("failed to materialize functions: {0}")]
  Materialize(#[from] MaterializeError),
}

/// Progress sink for a run.
///
/// Notifications are observational; they never affect control flow.
pub trait BuildStatus: Send + Sync {
  /// A phase started.
  fn busy(&self, message: &str);

  /// The run finished, successfully or not.
  fn idle(&self);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStatus;

impl BuildStatus for NoStatus {
  fn busy(&self, _message: &str) {}

  fn idle(&self) {}
}

/// Reports phases through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl BuildStatus for TracingStatus {
  fn busy(&self, message: &str) {
    info!(phase = %message, "status");
  }

  fn idle(&self) {
    info!("idle");
  }
}
