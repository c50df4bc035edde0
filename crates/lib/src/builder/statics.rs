//! Built-in static file builder.

use async_trait::async_trait;

use super::{BuildOutput, BuildOutputs, BuildRequest, Builder, BuilderError, StaticAsset};

/// Serves each matched entrypoint as-is under its own path.
///
/// Used for `@now/static` specs, which are never installed through the registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticBuilder;

#[async_trait]
impl Builder for StaticBuilder {
  async fn build(&self, request: &BuildRequest) -> Result<BuildOutputs, BuilderError> {
    let path = match request.files.get(&request.entrypoint) {
      Some(file) => file.absolute_path.clone(),
      None => request.work_path.join(&request.entrypoint),
    };

    let mut outputs = BuildOutputs::new();
    outputs.insert(
      request.entrypoint.clone(),
      BuildOutput::StaticAsset(StaticAsset::fs(path)),
    );
    Ok(outputs)
  }
}
