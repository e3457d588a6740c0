// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "config file parsed");

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the raw config for a run.
///
/// A missing file at the *default* location means built-in defaults; a
/// missing file that was asked for explicitly is an error.
pub fn load_raw_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !explicit && !path.exists() {
        info!(
            path = %path.display(),
            "no config file found; using built-in defaults"
        );
        return Ok(RawConfigFile::default());
    }
    load_from_path(path)
}

/// Default config location: `Quantflow.toml` in the current working
/// directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Quantflow.toml")
}
