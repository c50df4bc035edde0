use anyhow::Result;

use devbuild_lib::config::DevConfig;
use devbuild_lib::consts::{MANIFEST_FILE, SUPPORT_LIBRARY_ID};

use crate::output::{print_stat, print_success};

pub fn cmd_info() -> Result<()> {
  let config = DevConfig::from_env();

  print_success(&format!("devbuild v{}", env!("CARGO_PKG_VERSION")));
  print_stat("Builders", &config.builders_dir.display().to_string());
  print_stat("Functions", &config.functions_dir.display().to_string());
  print_stat("Manifest", MANIFEST_FILE);
  print_stat("Support library", SUPPORT_LIBRARY_ID);

  Ok(())
}
