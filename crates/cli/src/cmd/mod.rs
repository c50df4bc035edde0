mod build;
mod files;
mod info;

pub use build::cmd_build;
pub use files::cmd_files;
pub use info::cmd_info;
