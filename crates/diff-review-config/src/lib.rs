//! Configuration and file locations for the diff review engine
//!
//! This crate provides:
//! - Engine configuration (EngineConfig)
//! - Configuration file loading (TOML)
//! - Config and cache directory paths

pub mod config_file;
pub mod engine_config;
pub mod paths;

pub use config_file::load_config_file;
pub use engine_config::{EngineConfig, ViewTypePreference};
pub use paths::{cache_dir, config_dir};
