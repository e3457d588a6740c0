// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;

/// Command-line arguments for `quantflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "quantflow",
    version,
    about = "Build a salmon index, quantify samples and summarize the results.",
    long_about = None
)]
pub struct CliArgs {
    /// Sample manifest: one sample id per line.
    #[arg(long, value_name = "PATH")]
    pub manifest: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Quantflow.toml` in the current working directory; if that
    /// file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of tasks running at once (overrides `[config].workers`).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Threads handed to salmon (overrides `[salmon].threads`).
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Data directory (overrides `[paths].data_root`).
    #[arg(long, value_name = "PATH")]
    pub data_root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `QUANTFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Discover the task graph and print it with each task's status, but
    /// don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, raw: &mut RawConfigFile) {
        if let Some(workers) = self.workers {
            raw.config.workers = workers;
        }
        if let Some(threads) = self.threads {
            raw.salmon.threads = threads;
        }
        if let Some(data_root) = &self.data_root {
            raw.paths.data_root = data_root.clone();
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
