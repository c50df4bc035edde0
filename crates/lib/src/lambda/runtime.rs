//! Runtime launchers for local functions.
//!
//! A runtime identifier is mapped to the process that runs the function:
//! custom runtimes ship their own executable, interpreted runtimes are started
//! through a small bootstrap that loads the handler, feeds it the event from
//! stdin and prints the JSON result to stdout.

use std::path::{Path, PathBuf};

use tokio::process::Command;

const NODE_BOOTSTRAP: &str = r#"
const path = require('path');
const spec = process.env._HANDLER;
const dot = spec.lastIndexOf('.');
const file = spec.slice(0, dot);
const name = spec.slice(dot + 1);
let input = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', chunk => { input += chunk; });
process.stdin.on('end', async () => {
  try {
    const handler = require(path.join(process.env.LAMBDA_TASK_ROOT, file))[name];
    const event = input.trim() ? JSON.parse(input) : {};
    const result = await new Promise((resolve, reject) => {
      const ret = handler(event, {}, (err, value) => (err ? reject(err) : resolve(value)));
      if (ret && typeof ret.then === 'function') ret.then(resolve, reject);
    });
    process.stdout.write(JSON.stringify(result === undefined ? null : result));
  } catch (err) {
    console.error((err && err.stack) || String(err));
    process.exit(1);
  }
});
"#;

const PYTHON_BOOTSTRAP: &str = r#"
import importlib, json, os, sys
module, name = os.environ['_HANDLER'].rsplit('.', 1)
sys.path.insert(0, os.environ['LAMBDA_TASK_ROOT'])
handler = getattr(importlib.import_module(module.replace('/', '.')), name)
data = sys.stdin.read()
result = handler(json.loads(data) if data.strip() else {}, None)
sys.stdout.write(json.dumps(result))
"#;

/// How a function process is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
  /// An executable shipped in the code archive, relative to the code directory.
  Executable(PathBuf),
  /// An interpreter on `PATH` evaluating a bootstrap script.
  Interpreter {
    program: &'static str,
    flag: &'static str,
    bootstrap: &'static str,
  },
}

impl Launcher {
  /// Resolve the launcher for a runtime identifier.
  ///
  /// Returns `None` for runtimes that cannot run locally.
  pub fn for_runtime(runtime: &str, handler: &str) -> Option<Self> {
    if runtime.starts_with("provided") {
      return Some(Launcher::Executable(PathBuf::from("bootstrap")));
    }
    if runtime == "go1.x" {
      return Some(Launcher::Executable(PathBuf::from(handler)));
    }
    if runtime.starts_with("nodejs") {
      return Some(Launcher::Interpreter {
        program: "node",
        flag: "-e",
        bootstrap: NODE_BOOTSTRAP,
      });
    }
    if runtime.starts_with("python3") {
      return Some(Launcher::Interpreter {
        program: "python3",
        flag: "-c",
        bootstrap: PYTHON_BOOTSTRAP,
      });
    }
    None
  }

  /// Executable the launcher expects inside the code directory, if any.
  pub fn executable(&self) -> Option<&Path> {
    match self {
      Launcher::Executable(path) => Some(path),
      Launcher::Interpreter { .. } => None,
    }
  }

  pub fn command(&self, code_dir: &Path) -> Command {
    match self {
      Launcher::Executable(path) => Command::new(code_dir.join(path)),
      Launcher::Interpreter {
        program,
        flag,
        bootstrap,
      } => {
        let mut command = Command::new(program);
        command.arg(flag).arg(bootstrap);
        command
      }
    }
  }
}
