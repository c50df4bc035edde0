//! devbuild-lib: local build orchestration for deployment previews
//!
//! This crate turns a project's declared build specs into the outputs a
//! deployment would serve, without leaving the developer's machine:
//! - `ignores`: project ignore rules merged into one matcher
//! - `harvest`: ignore-aware project file discovery
//! - `builder`: the builder plugin contract and registry
//! - `orchestrate`: installs builders, runs every spec and merges outputs
//! - `lambda`: turns function bundles into locally invokable functions

pub mod builder;
pub mod config;
pub mod consts;
pub mod harvest;
pub mod ignores;
pub mod lambda;
pub mod manifest;
pub mod orchestrate;
pub mod platform;
pub mod util;
