//! Builder plugins.
//!
//! A builder turns one entrypoint into a set of build outputs. Builders are
//! external components resolved by identifier at runtime through a
//! [`BuilderRegistry`]; the orchestrator only ever sees `Arc<dyn Builder>`.
//!
//! # Submodules
//!
//! - [`registry`] - install/lookup boundary and the filesystem-backed registry
//! - [`process`] - builders running as child processes speaking JSON
//! - [`statics`] - the built-in static file builder

pub mod process;
pub mod registry;
pub mod statics;
mod types;

use async_trait::async_trait;

pub use process::ProcessBuilder;
pub use registry::{BuilderRegistry, LocalRegistry, RegistryError};
pub use statics::StaticBuilder;
pub use types::*;

/// A builder plugin.
#[async_trait]
pub trait Builder: Send + Sync {
  /// Build a single entrypoint.
  async fn build(&self, request: &BuildRequest) -> Result<BuildOutputs, BuilderError>;
}
