// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to built-in defaults (`loader.rs`).
//! - Validate roots, patterns and composite tasks (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_or_default};
pub use model::{
    CompositeConfig, ConfigFile, ConfigSection, PathConfig, PatternsSection, RawConfigFile,
    ScriptsSection, StylesSection,
};
