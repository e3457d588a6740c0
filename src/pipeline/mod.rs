// src/pipeline/mod.rs

//! The RNA-seq quantification stages.
//!
//! Every task holds an `Arc<PipelineConfig>` for the shared settings and
//! binds only the per-instance parameters it needs (e.g. a sample id), so
//! two downstream tasks asking for the same upstream resolve to the same
//! key.
//!
//! - [`inputs`]: pre-existing files (reference, reads, annotation, programs).
//! - [`index`] and [`quant`]: salmon invocations.
//! - [`summary`]: per-sample results merged into summary tables.
//! - [`preprocess`]: figures and gene-level tables.
//! - [`wrapup`]: the top-level task.
//! - [`table`] and [`plot`]: the tabular operations and the bar-chart
//!   renderer the in-process stages are built from.

pub mod index;
pub mod inputs;
pub mod manifest;
pub mod plot;
pub mod preprocess;
pub mod quant;
pub mod summary;
pub mod table;
pub mod wrapup;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::external::resolve_program;
use crate::target::Output;
use crate::task::Inputs;

pub use index::SalmonIndex;
pub use preprocess::{CleanCounts, MapFigure};
pub use quant::SalmonQuant;
pub use summary::{SummarizeCounts, SummarizeMapping};
pub use wrapup::AllReports;

/// Name of salmon's per-sample quantification table.
pub const QUANT_TABLE: &str = "quant.sf";

/// Requirement names of per-sample dependencies are `sample/<id>`; sample ids
/// can never contain `/`, so these never collide with other names.
const SAMPLE_PREFIX: &str = "sample/";

/// Settings shared by every task in a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    config: ConfigFile,
    manifest: PathBuf,
}

impl PipelineConfig {
    pub fn new(config: ConfigFile, manifest: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            config,
            manifest: manifest.into(),
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Sample ids, re-read from the manifest on every call.
    pub fn sample_ids(&self) -> Result<Vec<String>> {
        manifest::read_manifest(&self.manifest)
    }

    pub fn data_root(&self) -> &Path {
        &self.config.paths.data_root
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_root().join("index")
    }

    pub fn output_root(&self) -> PathBuf {
        self.data_root().join("output")
    }

    pub fn summary_root(&self) -> PathBuf {
        self.data_root().join("summary")
    }

    pub fn fastq_root(&self) -> PathBuf {
        self.data_root().join("fastq")
    }

    /// Salmon's output directory for one sample.
    pub fn sample_dir(&self, file_id: &str) -> PathBuf {
        self.output_root().join(file_id)
    }

    /// The salmon executable, looked up on `PATH` when given as a bare name.
    pub fn salmon_program(&self) -> PathBuf {
        resolve_program(&self.config.salmon.program)
    }

    pub fn interpreter(&self) -> PathBuf {
        resolve_program(&self.config.summary.interpreter)
    }
}

pub(crate) fn sample_requirement(file_id: &str) -> String {
    format!("{SAMPLE_PREFIX}{file_id}")
}

/// Per-sample inputs in manifest order, as `(sample id, output)`.
pub(crate) fn sample_inputs(inputs: &Inputs) -> impl Iterator<Item = (&str, &Output)> {
    inputs
        .iter()
        .filter_map(|(name, output)| name.strip_prefix(SAMPLE_PREFIX).map(|id| (id, output)))
}
