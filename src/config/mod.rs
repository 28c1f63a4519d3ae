//! Configuration module
//!
//! TOML settings for the API connection, grid defaults, preference storage
//! and logging.

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{Config, PreferenceBackend};
