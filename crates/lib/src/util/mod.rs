//! Shared utilities.
//!
//! Serde helpers used by the builder wire format and test helpers.

pub mod base64;

#[cfg(test)]
pub mod testutil;
