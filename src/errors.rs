// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuantflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Missing external inputs: {}", display_paths(.0))]
    MissingInputs(Vec<PathBuf>),

    #[error("program '{program}' exited with {}{}", display_code(.code), display_tail(.stderr_tail))]
    ProgramFailed {
        program: String,
        code: Option<i32>,
        stderr_tail: Vec<String>,
    },

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuantflowError {
    /// Whether this error belongs to the "fatal before execution" category.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QuantflowError::ConfigError(_)
                | QuantflowError::TomlError(_)
                | QuantflowError::DagCycle(_)
                | QuantflowError::InvalidManifest(_)
                | QuantflowError::MissingInputs(_)
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn display_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("; stderr tail:\n{}", tail.join("\n"))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, QuantflowError>;
