// src/pipeline/manifest.rs

//! The sample manifest: one sample id per line.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::errors::{QuantflowError, Result};

/// Sample ids become directory names, so they are restricted to a safe
/// alphabet.
const SAMPLE_ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]*$";

/// Read and validate the manifest at `path`.
pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        QuantflowError::InvalidManifest(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_manifest(&contents)
        .map_err(|e| match e {
            QuantflowError::InvalidManifest(msg) => {
                QuantflowError::InvalidManifest(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
}

/// Parse manifest text.
///
/// Surrounding whitespace is trimmed, blank lines and `#` comments are
/// skipped. Ids must be unique and the manifest must name at least one
/// sample.
pub fn parse_manifest(contents: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(SAMPLE_ID_PATTERN)
        .map_err(|e| QuantflowError::InvalidManifest(format!("sample id pattern: {e}")))?;

    let mut ids = Vec::new();
    let mut seen = HashSet::new();

    for (lineno, line) in contents.lines().enumerate() {
        let id = line.trim();
        if id.is_empty() || id.starts_with('#') {
            continue;
        }
        if !pattern.is_match(id) {
            return Err(QuantflowError::InvalidManifest(format!(
                "line {}: invalid sample id {id:?}",
                lineno + 1
            )));
        }
        if !seen.insert(id.to_string()) {
            return Err(QuantflowError::InvalidManifest(format!(
                "line {}: duplicate sample id {id:?}",
                lineno + 1
            )));
        }
        ids.push(id.to_string());
    }

    if ids.is_empty() {
        return Err(QuantflowError::InvalidManifest(
            "no sample ids listed".to_string(),
        ));
    }

    Ok(ids)
}
