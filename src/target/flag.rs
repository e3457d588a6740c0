// src/target/flag.rs

//! Directory-shaped outputs marked complete by a sentinel file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{LocalTarget, Target};

/// Name of the sentinel written inside a finished output directory.
pub const SUCCESS_FLAG: &str = "__SUCCESS";

/// A whole directory (e.g. a salmon index) whose completeness is recorded by
/// a small flag file inside it.
///
/// The flag must only be published after the step that fills the directory
/// has returned successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTarget {
    dir: PathBuf,
    flag: LocalTarget,
}

impl FlagTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_flag_name(dir, SUCCESS_FLAG)
    }

    pub fn with_flag_name(dir: impl Into<PathBuf>, flag_name: &str) -> Self {
        let dir = dir.into();
        let flag = LocalTarget::new(dir.join(flag_name));
        Self { dir, flag }
    }

    /// The directory the flag guards.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the sentinel file itself.
    pub fn flag_path(&self) -> &Path {
        self.flag.path()
    }

    /// Make sure the guarded directory exists so a program can write into it.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("creating dir {:?}", self.dir))
    }

    /// Atomically write the sentinel, marking the directory complete.
    pub fn publish(&self) -> Result<()> {
        self.flag.write_bytes(b"")
    }
}

impl Target for FlagTarget {
    fn exists(&self) -> bool {
        self.flag.path().is_file()
    }

    fn paths(&self) -> Vec<PathBuf> {
        vec![self.flag.path().to_path_buf()]
    }
}
