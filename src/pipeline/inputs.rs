// src/pipeline/inputs.rs

//! Files the pipeline consumes but never produces.

use crate::target::{LocalTarget, TargetGroup};
use crate::task::{ExternalInput, TaskKey};

use super::PipelineConfig;

/// The reference transcriptome FASTA.
pub fn reference_transcriptome(cfg: &PipelineConfig) -> ExternalInput {
    ExternalInput::file("ReferenceTranscriptome", cfg.config().reference_path())
}

/// The salmon executable.
pub fn salmon_binary(cfg: &PipelineConfig) -> ExternalInput {
    ExternalInput::file("SalmonBinary", cfg.salmon_program())
}

/// The interpreter that runs the mapping-summary script.
pub fn interpreter(cfg: &PipelineConfig) -> ExternalInput {
    ExternalInput::file("Interpreter", cfg.interpreter())
}

/// Transcript-to-gene annotation table.
pub fn annotation_file(cfg: &PipelineConfig) -> ExternalInput {
    ExternalInput::file("AnnotationFile", cfg.config().annotation_path())
}

/// The mapping-summary script.
pub fn mapping_script(cfg: &PipelineConfig) -> ExternalInput {
    ExternalInput::file("MappingScript", cfg.config().mapping_script_path())
}

/// Paired-end reads of one sample, as the group `{R1, R2}`.
pub fn fastq_input(cfg: &PipelineConfig, file_id: &str) -> ExternalInput {
    let fastq = &cfg.config().fastq;
    let root = cfg.fastq_root();
    let read = |tag: &str| LocalTarget::new(root.join(format!("{file_id}{tag}{}", fastq.suffix)));

    let key = TaskKey::new("FastqInput").param("file_id", file_id);
    let output = TargetGroup::new()
        .with("R1", read(&fastq.r1))
        .with("R2", read(&fastq.r2));

    ExternalInput::with_output(key, output)
}
