// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Assetpipe.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration used by the CLI.
///
/// - An explicit path must exist.
/// - Without one, `Assetpipe.toml` is used when present; otherwise the
///   built-in defaults apply.
///
/// Returns the config together with the path it was (or would have been)
/// read from, so callers can derive the project root from it.
pub fn load_or_default(explicit: Option<&Path>) -> Result<(ConfigFile, PathBuf)> {
    if let Some(path) = explicit {
        return Ok((load_and_validate(path)?, path.to_path_buf()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if path.is_file() {
        return Ok((load_and_validate(&path)?, path));
    }

    debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
    Ok((ConfigFile::try_from(RawConfigFile::default())?, path))
}
