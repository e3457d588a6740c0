// src/target/local.rs

//! Single-file targets with atomic publication.
//!
//! Every write goes to a temporary file created in the *same* directory as
//! the final path and is renamed over it only once the producer returned
//! successfully. On any error the temporary file is dropped (and therefore
//! removed), so `exists()` never observes a half-written file.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::{Builder, NamedTempFile, TempPath};
use tracing::debug;

use super::Target;

/// A target backed by a single file on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    path: PathBuf,
    /// Keep the final extension on the temporary file (`foo-tmpXXXX.png`).
    suffix_preserving: bool,
}

impl LocalTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            suffix_preserving: false,
        }
    }

    /// Variant whose temporary file carries the final path's extension.
    ///
    /// Needed by writers that pick an encoding from the file name, such as
    /// the PNG renderer.
    pub fn suffix_preserving(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            suffix_preserving: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_suffix_preserving(&self) -> bool {
        self.suffix_preserving
    }

    /// Open the published file for reading.
    pub fn open_read(&self) -> Result<BufReader<fs::File>> {
        let file = fs::File::open(&self.path)
            .with_context(|| format!("opening target {:?} for reading", self.path))?;
        Ok(BufReader::new(file))
    }

    /// Atomically write the target through `producer`.
    ///
    /// The producer receives a buffered writer over the temporary file. The
    /// file is flushed and synced before the rename.
    pub fn write_with<F>(&self, producer: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let mut tmp = self.create_temp_file()?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            producer(&mut writer)
                .with_context(|| format!("producing contents for {:?}", self.path))?;
            writer
                .flush()
                .with_context(|| format!("flushing temporary file for {:?}", self.path))?;
        }
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("syncing temporary file for {:?}", self.path))?;

        let tmp_path = tmp.path().to_path_buf();
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("renaming {:?} to {:?}", tmp_path, self.path))?;

        debug!(target_path = ?self.path, "published target");
        Ok(())
    }

    /// Hand a temporary path to `f` and publish it if `f` succeeds.
    ///
    /// Used when something other than this process (e.g. an external
    /// program) writes the file. The temporary path exists as an empty file
    /// when `f` is called; `f` may overwrite it.
    pub fn with_temporary_path<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let tmp: TempPath = self.create_temp_file()?.into_temp_path();
        let value = f(&tmp)?;

        if !tmp.exists() {
            anyhow::bail!(
                "temporary file {:?} for {:?} disappeared before publishing",
                &*tmp,
                self.path
            );
        }

        let tmp_display = tmp.to_path_buf();
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("renaming {:?} to {:?}", tmp_display, self.path))?;

        debug!(target_path = ?self.path, "published target from temporary path");
        Ok(value)
    }

    /// Atomically write raw bytes.
    pub fn write_bytes(&self, contents: &[u8]) -> Result<()> {
        self.write_with(|w| {
            w.write_all(contents)?;
            Ok(())
        })
    }

    fn create_temp_file(&self) -> Result<NamedTempFile> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).with_context(|| format!("creating dir {:?}", dir))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("target path {:?} has no usable file name", self.path))?;

        let (stem, ext) = match (self.suffix_preserving, split_extension(file_name)) {
            (true, Some((stem, ext))) => (stem.to_string(), format!(".{ext}")),
            _ => (file_name.to_string(), String::new()),
        };

        Builder::new()
            .prefix(&format!(".{stem}-tmp"))
            .suffix(&ext)
            .tempfile_in(&dir)
            .with_context(|| format!("creating temporary file in {:?}", dir))
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Target for LocalTarget {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn paths(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}

/// Split `name.ext` into `("name", "ext")`. Dotfiles without a further dot
/// have no extension.
fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    let idx = file_name.rfind('.')?;
    if idx == 0 || idx == file_name.len() - 1 {
        return None;
    }
    Some((&file_name[..idx], &file_name[idx + 1..]))
}
