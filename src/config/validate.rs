// src/config/validate.rs

use std::path::Path;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{QuantflowError, Result};

/// Salmon library type codes: `A`, `IU`, `ISR`, ...
const LIBRARY_TYPE_PATTERN: &str = r"^[A-Z]{1,3}$";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = QuantflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_paths(cfg)?;
    validate_fastq(cfg)?;
    validate_salmon(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.workers == 0 {
        return Err(QuantflowError::ConfigError(
            "[config].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    non_empty_path("[paths].data_root", &cfg.paths.data_root)?;
    if let Some(reference) = &cfg.paths.reference {
        non_empty_path("[paths].reference", reference)?;
    }
    if let Some(annotation) = &cfg.paths.annotation {
        non_empty_path("[paths].annotation", annotation)?;
    }
    non_empty_path("[salmon].program", &cfg.salmon.program)?;
    non_empty_path("[summary].interpreter", &cfg.summary.interpreter)?;
    if let Some(script) = &cfg.summary.mapping_script {
        non_empty_path("[summary].mapping_script", script)?;
    }
    Ok(())
}

fn validate_fastq(cfg: &RawConfigFile) -> Result<()> {
    let fastq = &cfg.fastq;
    if fastq.r1 == fastq.r2 {
        return Err(QuantflowError::ConfigError(format!(
            "[fastq].r1 and [fastq].r2 must differ (both are {:?})",
            fastq.r1
        )));
    }
    for (field, value) in [("r1", &fastq.r1), ("r2", &fastq.r2), ("suffix", &fastq.suffix)] {
        if value.contains('/') {
            return Err(QuantflowError::ConfigError(format!(
                "[fastq].{field} must not contain '/' (got {value:?})"
            )));
        }
    }
    Ok(())
}

fn validate_salmon(cfg: &RawConfigFile) -> Result<()> {
    let salmon = &cfg.salmon;
    if salmon.threads == 0 {
        return Err(QuantflowError::ConfigError(
            "[salmon].threads must be >= 1 (got 0)".to_string(),
        ));
    }
    let library_type = Regex::new(LIBRARY_TYPE_PATTERN)
        .map_err(|e| QuantflowError::ConfigError(format!("library type pattern: {e}")))?;
    if !library_type.is_match(&salmon.library_type) {
        return Err(QuantflowError::ConfigError(format!(
            "[salmon].library_type must be 1-3 uppercase letters (got {:?})",
            salmon.library_type
        )));
    }
    Ok(())
}

fn non_empty_path(field: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(QuantflowError::ConfigError(format!("{field} must not be empty")));
    }
    Ok(())
}
