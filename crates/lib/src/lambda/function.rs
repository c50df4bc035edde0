//! Locally invokable functions.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use zip::ZipArchive;

use super::MaterializeError;
use super::runtime::Launcher;
use crate::builder::LambdaBundle;
use crate::consts::{DEV_REGION, REGION_ENV_VAR};

/// Everything needed to create a [`LocalFunction`].
#[derive(Debug, Clone)]
pub struct FunctionDefinition {
  /// Output path the function is served under.
  pub name: String,
  /// Zip archive with the function code.
  pub code: Vec<u8>,
  pub handler: String,
  pub runtime: String,
  pub environment: BTreeMap<String, String>,
}

impl FunctionDefinition {
  /// Build the definition for a bundle served at `name`.
  ///
  /// The environment is the bundle's own variables followed by the local
  /// region variable, which always wins.
  pub fn from_bundle(name: &str, bundle: &LambdaBundle) -> Self {
    let mut environment = bundle.environment.clone();
    environment.insert(REGION_ENV_VAR.to_string(), DEV_REGION.to_string());

    Self {
      name: name.to_string(),
      code: bundle.zip_buffer.clone(),
      handler: bundle.handler.clone(),
      runtime: bundle.runtime.clone(),
      environment,
    }
  }
}

/// Errors from invoking a local function.
#[derive(Debug, Error)]
pub enum InvokeError {
  /// The function process could not be started or talked to.
  #[error("failed to run function {name}: {source}")]
  Io {
    name: String,
    #[source]
    source: std::io::Error,
  },

  /// The event could not be encoded.
  #[error("failed to encode event: {0}")]
  Encode(#[from] serde_json::Error),

  /// The function exited unsuccessfully.
  #[error("function {name} exited with code {code:?}: {stderr}")]
  Failed {
    name: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// Output of one invocation.
#[derive(Debug, Clone)]
pub struct InvokeOutput {
  /// Raw response written by the function.
  pub payload: Vec<u8>,
  /// Log output written to stderr.
  pub logs: String,
}

impl InvokeOutput {
  /// Parse the response as JSON.
  pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_slice(&self.payload)
  }
}

/// A function bundle extracted to disk and ready to run.
///
/// The extracted code directory is removed when the function is dropped.
#[derive(Debug)]
pub struct LocalFunction {
  name: String,
  handler: String,
  runtime: String,
  environment: BTreeMap<String, String>,
  launcher: Launcher,
  code_dir: TempDir,
}

impl LocalFunction {
  /// Extract the function code below `functions_dir` and resolve its runtime.
  ///
  /// Performs blocking filesystem work.
  pub fn create(definition: FunctionDefinition, functions_dir: &Path) -> Result<Self, MaterializeError> {
    let FunctionDefinition {
      name,
      code,
      handler,
      runtime,
      environment,
    } = definition;

    let launcher = Launcher::for_runtime(&runtime, &handler).ok_or_else(|| MaterializeError::UnsupportedRuntime {
      name: name.clone(),
      runtime: runtime.clone(),
    })?;

    if let Some(executable) = launcher.executable()
      && !is_plain_file_name(executable)
    {
      return Err(MaterializeError::InvalidExecutable {
        name,
        path: executable.to_path_buf(),
      });
    }

    fs::create_dir_all(functions_dir).map_err(|source| MaterializeError::CreateDir {
      path: functions_dir.to_path_buf(),
      source,
    })?;
    let code_dir = tempfile::Builder::new()
      .prefix(&dir_prefix(&name))
      .tempdir_in(functions_dir)
      .map_err(|source| MaterializeError::CreateDir {
        path: functions_dir.to_path_buf(),
        source,
      })?;

    extract(&name, &code, code_dir.path())?;

    if let Some(executable) = launcher.executable()
      && !code_dir.path().join(executable).is_file()
    {
      return Err(MaterializeError::MissingExecutable {
        name,
        path: executable.to_path_buf(),
      });
    }

    debug!(function = %name, runtime = %runtime, dir = %code_dir.path().display(), "function extracted");

    Ok(Self {
      name,
      handler,
      runtime,
      environment,
      launcher,
      code_dir,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn handler(&self) -> &str {
    &self.handler
  }

  pub fn runtime(&self) -> &str {
    &self.runtime
  }

  pub fn environment(&self) -> &BTreeMap<String, String> {
    &self.environment
  }

  pub fn code_dir(&self) -> &Path {
    self.code_dir.path()
  }

  /// Run the function once with `event` as its input.
  ///
  /// The process gets a cleared environment with `PATH` and `HOME` from the
  /// host, the function's variables, and the task root and handler variables.
  pub async fn invoke(&self, event: &serde_json::Value) -> Result<InvokeOutput, InvokeError> {
    let payload = serde_json::to_vec(event)?;
    let io_err = |source| InvokeError::Io {
      name: self.name.clone(),
      source,
    };

    let mut command = self.launcher.command(self.code_dir());
    command
      .current_dir(self.code_dir())
      .env_clear()
      .env("PATH", std::env::var_os("PATH").unwrap_or_else(|| "/usr/bin:/bin".into()))
      .env("HOME", std::env::var_os("HOME").unwrap_or_else(|| std::env::temp_dir().into()))
      .env("TMPDIR", std::env::temp_dir())
      .env("LANG", "C");

    for (key, value) in &self.environment {
      command.env(key, value);
    }

    command
      .env("LAMBDA_TASK_ROOT", self.code_dir())
      .env("_HANDLER", &self.handler)
      .env("AWS_LAMBDA_FUNCTION_NAME", &self.name)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    debug!(function = %self.name, "invoking function");

    let mut child = command.spawn().map_err(io_err)?;
    let mut stdin = child
      .stdin
      .take()
      .ok_or_else(|| io_err(std::io::Error::other("function stdin unavailable")))?;

    let write = async move {
      stdin.write_all(&payload).await?;
      stdin.shutdown().await
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output.map_err(io_err)?;
    let logs = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
      return Err(InvokeError::Failed {
        name: self.name.clone(),
        code: output.status.code(),
        stderr: logs.trim().to_string(),
      });
    }

    if let Err(e) = written
      && e.kind() != std::io::ErrorKind::BrokenPipe
    {
      return Err(io_err(e));
    }

    Ok(InvokeOutput {
      payload: output.stdout,
      logs,
    })
  }
}

fn dir_prefix(name: &str) -> String {
  let sanitized: String = name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
    .collect();
  format!("{}-", sanitized.trim_matches('-'))
}

fn extract(name: &str, code: &[u8], dest: &Path) -> Result<(), MaterializeError> {
  let archive_err = |source| MaterializeError::Archive {
    name: name.to_string(),
    source,
  };
  let extract_err = |source| MaterializeError::Extract {
    name: name.to_string(),
    source,
  };

  let mut archive = ZipArchive::new(Cursor::new(code)).map_err(archive_err)?;

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i).map_err(archive_err)?;

    let path: PathBuf = entry
      .enclosed_name()
      .ok_or_else(|| extract_err(std::io::Error::other(format!("unsafe entry name: {}", entry.name()))))?;
    let dest_path = dest.join(path);

    if entry.is_dir() {
      fs::create_dir_all(&dest_path).map_err(extract_err)?;
      continue;
    }

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent).map_err(extract_err)?;
    }

    let mut outfile = File::create(&dest_path).map_err(extract_err)?;
    std::io::copy(&mut entry, &mut outfile).map_err(extract_err)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode)).map_err(extract_err)?;
      }
    }
  }

  Ok(())
}

/// A single normal path component, so joining it stays inside the code directory.
fn is_plain_file_name(path: &Path) -> bool {
  let mut components = path.components();
  matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
