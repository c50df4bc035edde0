//! Implementation of the `devbuild build` command.
//!
//! Loads the project manifest, runs every build spec through the orchestrator
//! and lists the resulting outputs.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use devbuild_lib::builder::{BuildOutput, LocalRegistry};
use devbuild_lib::config::DevConfig;
use devbuild_lib::manifest::ProjectManifest;
use devbuild_lib::orchestrate::{self, BuildResultSet, TracingStatus};

use crate::output::{format_bytes, format_duration, print_info, print_json, print_output, print_success, symbols};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputSummary<'a> {
  path: &'a str,
  kind: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  runtime: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  handler: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  code_size: Option<usize>,
}

fn summarize(results: &BuildResultSet) -> Vec<OutputSummary<'_>> {
  results
    .iter()
    .map(|(path, output)| match output {
      BuildOutput::StaticAsset(_) => OutputSummary {
        path,
        kind: output.kind(),
        runtime: None,
        handler: None,
        code_size: None,
      },
      BuildOutput::Lambda(bundle) => OutputSummary {
        path,
        kind: output.kind(),
        runtime: Some(bundle.runtime.as_str()),
        handler: Some(bundle.handler.as_str()),
        code_size: Some(bundle.zip_buffer.len()),
      },
    })
    .collect()
}

/// Execute the build command.
///
/// Builders are resolved from the configured builders directory; functions
/// are extracted below the functions directory and removed again on exit.
pub fn cmd_build(dir: &Path, json: bool) -> Result<()> {
  let root = dunce::canonicalize(dir).with_context(|| format!("Project directory not found: {}", dir.display()))?;
  let manifest = ProjectManifest::load(&root).context("Failed to load project manifest")?;
  let specs = manifest.build_specs();
  debug!(specs = specs.len(), root = %root.display(), "loaded build specs");

  let config = DevConfig::from_env();
  let registry = LocalRegistry::from_config(&config);

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let results = rt
    .block_on(orchestrate::run(
      &specs,
      &root,
      &registry,
      &TracingStatus,
      &config.materialize(),
    ))
    .context("Build failed")?;
  let elapsed = started.elapsed();

  let summary = summarize(&results);

  if json {
    return print_json(&serde_json::json!({
      "root": root,
      "outputs": summary,
    }));
  }

  if summary.is_empty() {
    print_info("No outputs produced.");
    return Ok(());
  }

  print_success(&format!(
    "Built {} output(s) in {}",
    summary.len(),
    format_duration(elapsed)
  ));
  for item in &summary {
    match (item.runtime, item.code_size) {
      (Some(runtime), Some(size)) => print_output(
        symbols::LAMBDA,
        item.path,
        &format!("{}, {}", runtime, format_bytes(size as u64)),
      ),
      _ => print_output(symbols::STATIC, item.path, item.kind),
    }
  }

  Ok(())
}
