// src/config/mod.rs

//! Configuration loading and validation for automan.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn the raw model into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    AutomationsSection, ConfigFile, DiscoveryConfig, ExecutionConfig, ExecutionSection,
    RawConfigFile,
};
pub use validate::parse_duration;
