//! Builders running as child processes.
//!
//! The builder executable receives the JSON-encoded [`BuildRequest`] on stdin
//! and prints a JSON object mapping output paths to outputs on stdout. A
//! non-zero exit status fails the entrypoint; stderr is kept for diagnostics.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{BuildOutputs, BuildRequest, Builder, BuilderError};

/// Environment variable set for every builder process.
pub const BUILDER_ENV_VAR: &str = "NOW_BUILDER";

/// A builder backed by an executable on disk.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
  id: String,
  program: PathBuf,
}

impl ProcessBuilder {
  pub fn new(id: impl Into<String>, program: impl Into<PathBuf>) -> Self {
    Self {
      id: id.into(),
      program: program.into(),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn program(&self) -> &Path {
    &self.program
  }
}

#[async_trait]
impl Builder for ProcessBuilder {
  async fn build(&self, request: &BuildRequest) -> Result<BuildOutputs, BuilderError> {
    let payload = serde_json::to_vec(request)?;

    debug!(
      builder = %self.id,
      program = %self.program.display(),
      entrypoint = %request.entrypoint,
      "spawning builder"
    );

    let mut child = Command::new(&self.program)
      .current_dir(&request.work_path)
      .env(BUILDER_ENV_VAR, "1")
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()?;

    let mut stdin = child
      .stdin
      .take()
      .ok_or_else(|| std::io::Error::other("builder stdin unavailable"))?;

    // Feed stdin while draining stdout so neither side blocks on a full pipe.
    let write = async move {
      stdin.write_all(&payload).await?;
      stdin.shutdown().await
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      return Err(BuilderError::Failed {
        code: output.status.code(),
        stderr,
      });
    }

    if let Err(e) = written
      && e.kind() != std::io::ErrorKind::BrokenPipe
    {
      return Err(BuilderError::Io(e));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
      debug!(builder = %self.id, stderr = %stderr.trim(), "builder stderr");
    }

    Ok(serde_json::from_slice(&output.stdout)?)
  }
}
