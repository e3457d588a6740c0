// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// workers = 2
///
/// [paths]
/// data_root = "data"
///
/// [salmon]
/// threads = 8
/// library_type = "IU"
/// ```
///
/// All sections are optional and have reasonable defaults. Paths left unset
/// in `[paths]` and `[summary]` are resolved under `data_root`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub fastq: FastqSection,

    #[serde(default)]
    pub salmon: SalmonSection,

    #[serde(default)]
    pub summary: SummarySection,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub paths: PathsSection,
    pub fastq: FastqSection,
    pub salmon: SalmonSection,
    pub summary: SummarySection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            paths: raw.paths,
            fastq: raw.fastq,
            salmon: raw.salmon,
            summary: raw.summary,
        }
    }

    /// Reference transcriptome FASTA.
    pub fn reference_path(&self) -> PathBuf {
        self.paths
            .reference
            .clone()
            .unwrap_or_else(|| self.paths.data_root.join("reference").join("transcripts.fa"))
    }

    /// Transcript-to-gene annotation table.
    pub fn annotation_path(&self) -> PathBuf {
        self.paths
            .annotation
            .clone()
            .unwrap_or_else(|| self.paths.data_root.join("annotation.tsv"))
    }

    /// Mapping-summary script run by the interpreter.
    pub fn mapping_script_path(&self) -> PathBuf {
        self.summary.mapping_script.clone().unwrap_or_else(|| {
            self.paths
                .data_root
                .join("scripts")
                .join("get_salmon_summary.pl")
        })
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section: engine behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of task bodies running at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Root of `index/`, `output/`, `summary/` and `fastq/`.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Default: `<data_root>/reference/transcripts.fa`.
    #[serde(default)]
    pub reference: Option<PathBuf>,

    /// Default: `<data_root>/annotation.tsv`.
    #[serde(default)]
    pub annotation: Option<PathBuf>,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            reference: None,
            annotation: None,
        }
    }
}

/// `[fastq]` section: how read files are named.
///
/// Sample `S` reads from `fastq/S{r1}{suffix}` and `fastq/S{r2}{suffix}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FastqSection {
    #[serde(default = "default_r1")]
    pub r1: String,
    #[serde(default = "default_r2")]
    pub r2: String,
    #[serde(default = "default_fastq_suffix")]
    pub suffix: String,
}

fn default_r1() -> String {
    "_R1".to_string()
}

fn default_r2() -> String {
    "_R2".to_string()
}

fn default_fastq_suffix() -> String {
    ".fastq.gz".to_string()
}

impl Default for FastqSection {
    fn default() -> Self {
        Self {
            r1: default_r1(),
            r2: default_r2(),
            suffix: default_fastq_suffix(),
        }
    }
}

/// `[salmon]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SalmonSection {
    /// Executable name (looked up on `PATH`) or path.
    #[serde(default = "default_salmon_program")]
    pub program: PathBuf,

    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Passed to `salmon quant -l`.
    #[serde(default = "default_library_type")]
    pub library_type: String,

    #[serde(default = "default_true")]
    pub pass_threads_to_index: bool,

    #[serde(default = "default_true")]
    pub pass_threads_to_quant: bool,
}

fn default_salmon_program() -> PathBuf {
    PathBuf::from("salmon")
}

fn default_threads() -> usize {
    4
}

fn default_library_type() -> String {
    "A".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SalmonSection {
    fn default() -> Self {
        Self {
            program: default_salmon_program(),
            threads: default_threads(),
            library_type: default_library_type(),
            pass_threads_to_index: true,
            pass_threads_to_quant: true,
        }
    }
}

/// `[summary]` section: the mapping-summary script.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarySection {
    #[serde(default = "default_interpreter")]
    pub interpreter: PathBuf,

    /// Default: `<data_root>/scripts/get_salmon_summary.pl`.
    #[serde(default)]
    pub mapping_script: Option<PathBuf>,
}

fn default_interpreter() -> PathBuf {
    PathBuf::from("perl")
}

impl Default for SummarySection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            mapping_script: None,
        }
    }
}
