//! # ankiforge Common Library
//!
//! Shared code for the ankiforge binaries:
//! - Error types
//! - Configuration loading (TOML bootstrap, environment, CLI overrides)
//! - Root folder resolution and on-disk data layout
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
