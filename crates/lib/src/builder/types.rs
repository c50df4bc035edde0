//! Builder wire types.
//!
//! These types form the contract with builder plugins, which are versioned
//! independently of this crate. Field names on the wire are camelCase and
//! every output carries a `"type"` tag:
//!
//! ```json
//! {
//!   "index.html": { "type": "FileBlob", "data": "PGgxPmhpPC9oMT4=" },
//!   "logo.png": { "type": "FileFsRef", "fsPath": "/project/logo.png" },
//!   "api/user.js": {
//!     "type": "Lambda",
//!     "zipBuffer": "UEsDBBQ...",
//!     "handler": "index.handler",
//!     "runtime": "nodejs8.10",
//!     "environment": {}
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::STATIC_BUILDER_ID;
use crate::harvest::ProjectFileSet;
use crate::lambda::LocalFunction;

/// Builder-specific configuration object.
pub type BuilderConfig = serde_json::Map<String, serde_json::Value>;

/// A declared rule mapping a source pattern to a builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
  /// Glob selecting the entrypoints, relative to the project root.
  pub src: String,
  /// Builder identifier.
  #[serde(rename = "use")]
  pub builder: String,
  /// Configuration passed to every invocation of the builder.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub config: Option<BuilderConfig>,
}

impl BuildSpec {
  pub fn new(src: impl Into<String>, builder: impl Into<String>) -> Self {
    Self {
      src: src.into(),
      builder: builder.into(),
      config: None,
    }
  }

  pub fn with_config(mut self, config: BuilderConfig) -> Self {
    self.config = Some(config);
    self
  }

  /// True for the built-in static builder, which is never installed.
  pub fn is_static(&self) -> bool {
    self.builder == STATIC_BUILDER_ID
  }
}

/// Input to a single builder invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
  /// Snapshot of the whole project, shared by every invocation of a run.
  pub files: Arc<ProjectFileSet>,
  /// Entrypoint path relative to the project root.
  pub entrypoint: String,
  /// Project root.
  pub work_path: PathBuf,
  pub config: BuilderConfig,
  /// Set for local preview builds; builders may skip slow optimizations.
  pub is_dev: bool,
}

/// Contents of a static output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRef {
  /// A file on disk.
  Fs(PathBuf),
  /// Bytes held in memory.
  Blob(Vec<u8>),
}

/// An output served as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
  pub content: FileRef,
  pub mode: Option<u32>,
}

impl StaticAsset {
  pub fn fs(path: impl Into<PathBuf>) -> Self {
    Self {
      content: FileRef::Fs(path.into()),
      mode: None,
    }
  }

  pub fn blob(data: impl Into<Vec<u8>>) -> Self {
    Self {
      content: FileRef::Blob(data.into()),
      mode: None,
    }
  }
}

/// Packaged function code plus the metadata needed to run it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaBundle {
  /// Zip archive with the function code.
  #[serde(with = "crate::util::base64")]
  pub zip_buffer: Vec<u8>,
  /// Entry handler, e.g. `index.handler`.
  pub handler: String,
  /// Runtime identifier, e.g. `nodejs8.10`.
  pub runtime: String,
  #[serde(default)]
  pub environment: BTreeMap<String, String>,
  /// Local function created by materialization.
  #[serde(skip)]
  pub function: Option<Arc<LocalFunction>>,
}

impl LambdaBundle {
  pub fn new(zip_buffer: Vec<u8>, handler: impl Into<String>, runtime: impl Into<String>) -> Self {
    Self {
      zip_buffer,
      handler: handler.into(),
      runtime: runtime.into(),
      environment: BTreeMap::new(),
      function: None,
    }
  }

  pub fn is_materialized(&self) -> bool {
    self.function.is_some()
  }
}

/// A single build output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "WireOutput", into = "WireOutput")]
pub enum BuildOutput {
  StaticAsset(StaticAsset),
  Lambda(LambdaBundle),
}

impl BuildOutput {
  pub fn kind(&self) -> &'static str {
    match self {
      BuildOutput::StaticAsset(_) => "static",
      BuildOutput::Lambda(_) => "lambda",
    }
  }

  pub fn as_lambda(&self) -> Option<&LambdaBundle> {
    match self {
      BuildOutput::Lambda(bundle) => Some(bundle),
      BuildOutput::StaticAsset(_) => None,
    }
  }

  pub fn as_static(&self) -> Option<&StaticAsset> {
    match self {
      BuildOutput::StaticAsset(asset) => Some(asset),
      BuildOutput::Lambda(_) => None,
    }
  }
}

/// Outputs of one builder invocation, keyed by output path.
pub type BuildOutputs = BTreeMap<String, BuildOutput>;

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum WireOutput {
  FileBlob {
    #[serde(with = "crate::util::base64")]
    data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
  },
  FileFsRef {
    #[serde(rename = "fsPath")]
    fs_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
  },
  Lambda(LambdaBundle),
}

impl From<WireOutput> for BuildOutput {
  fn from(wire: WireOutput) -> Self {
    match wire {
      WireOutput::FileBlob { data, mode } => BuildOutput::StaticAsset(StaticAsset {
        content: FileRef::Blob(data),
        mode,
      }),
      WireOutput::FileFsRef { fs_path, mode } => BuildOutput::StaticAsset(StaticAsset {
        content: FileRef::Fs(fs_path),
        mode,
      }),
      WireOutput::Lambda(bundle) => BuildOutput::Lambda(bundle),
    }
  }
}

impl From<BuildOutput> for WireOutput {
  fn from(output: BuildOutput) -> Self {
    match output {
      BuildOutput::StaticAsset(StaticAsset {
        content: FileRef::Blob(data),
        mode,
      }) => WireOutput::FileBlob { data, mode },
      BuildOutput::StaticAsset(StaticAsset {
        content: FileRef::Fs(fs_path),
        mode,
      }) => WireOutput::FileFsRef { fs_path, mode },
      BuildOutput::Lambda(bundle) => WireOutput::Lambda(bundle),
    }
  }
}

/// Errors a builder can report for one entrypoint.
#[derive(Debug, Error)]
pub enum BuilderError {
  /// The builder process exited unsuccessfully.
  #[error("builder exited with code {code:?}: {stderr}")]
  Failed { code: Option<i32>, stderr: String },

  /// The builder's request or response did not match the wire format.
  #[error("invalid builder response: {0}")]
  Protocol(#[from] serde_json::Error),

  /// I/O error while talking to the builder.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Error raised by an in-process builder.
  #[error("{0}")]
  Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BuilderError {
  pub fn other(message: impl Into<String>) -> Self {
    BuilderError::Other(message.into().into())
  }
}
