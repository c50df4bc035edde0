mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devbuild_lib::consts::ALL_FILES_PATTERN;

/// devbuild - preview deployment builds locally
#[derive(Parser)]
#[command(name = "devbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the project's builds and list the outputs
  Build {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Print the outputs as JSON
    #[arg(long)]
    json: bool,
  },

  /// List the project files a pattern selects
  Files {
    /// Project directory
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Glob selecting files relative to the project directory
    #[arg(short, long, default_value = ALL_FILES_PATTERN)]
    pattern: String,

    /// Print the files as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show version and configured directories
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build { dir, json } => cmd::cmd_build(&dir, json),
    Commands::Files { dir, pattern, json } => cmd::cmd_files(&dir, &pattern, json),
    Commands::Info => cmd::cmd_info(),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      output::print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
