use std::path::{Path, PathBuf};

use quantflow::config::{ConfigFile, RawConfigFile};
use quantflow::errors::Result;

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.config.workers = workers;
        self
    }

    pub fn data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.paths.data_root = root.into();
        self
    }

    pub fn annotation(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.paths.annotation = Some(path.into());
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.salmon.threads = threads;
        self
    }

    pub fn library_type(mut self, library_type: &str) -> Self {
        self.config.salmon.library_type = library_type.to_string();
        self
    }

    pub fn salmon_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.salmon.program = program.into();
        self
    }

    pub fn fastq_tags(mut self, r1: &str, r2: &str) -> Self {
        self.config.fastq.r1 = r1.to_string();
        self.config.fastq.r2 = r2.to_string();
        self
    }

    pub fn interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.config.summary.interpreter = interpreter.into();
        self
    }

    pub fn mapping_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.config.summary.mapping_script = Some(script.into());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    /// Validate, returning the error for negative tests.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a tab-separated file with a header row.
pub fn write_tsv(path: &Path, header: &[&str], rows: &[Vec<String>]) {
    let mut contents = header.join("\t");
    contents.push('\n');
    for row in rows {
        contents.push_str(&row.join("\t"));
        contents.push('\n');
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, contents).expect("write tsv");
}

/// Write a manifest listing `ids`, one per line.
pub fn write_manifest(path: &Path, ids: &[&str]) {
    let mut contents = ids.join("\n");
    contents.push('\n');
    std::fs::write(path, contents).expect("write manifest");
}
