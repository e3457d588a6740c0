// src/pipeline/summary.rs

//! Stages that merge every sample's quantification.

use std::fs;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExternalProgram;
use crate::target::{Output, TargetGroup};
use crate::task::{Inputs, Requirements, Task, TaskKey, TargetOutput};

use super::inputs::{interpreter, mapping_script};
use super::quant::quant_table;
use super::table::{read_quant, summarize_counts};
use super::{PipelineConfig, SalmonQuant, sample_inputs, sample_requirement};

/// One `SalmonQuant` per manifest entry, in manifest order.
fn per_sample_requirements(cfg: &Arc<PipelineConfig>) -> Result<Requirements> {
    let ids = cfg.sample_ids()?;
    debug!(samples = ids.len(), "manifest read");
    Ok(ids
        .iter()
        .fold(Requirements::new(), |reqs, id| {
            reqs.with(sample_requirement(id), SalmonQuant::new(cfg.clone(), id))
        }))
}

fn manifest_key(kind: &'static str, cfg: &PipelineConfig) -> TaskKey {
    TaskKey::new(kind).path_param("manifest", cfg.manifest())
}

/// Mapped reads and mapping rate per sample, extracted from salmon's logs by
/// the mapping-summary script.
///
/// The script is run as
/// `<interpreter> <script> <manifest> <output_root> <tmp_path>` and its
/// output file is published only if it exits successfully.
#[derive(Debug, Clone)]
pub struct SummarizeMapping {
    cfg: Arc<PipelineConfig>,
}

impl SummarizeMapping {
    pub fn new(cfg: Arc<PipelineConfig>) -> Self {
        Self { cfg }
    }
}

impl Task for SummarizeMapping {
    fn key(&self) -> TaskKey {
        manifest_key("SummarizeMapping", &self.cfg)
    }

    fn requires(&self) -> Result<Requirements> {
        Ok(per_sample_requirements(&self.cfg)?
            .with("interpreter", interpreter(&self.cfg))
            .with("script", mapping_script(&self.cfg)))
    }

    fn output(&self) -> Output {
        TargetOutput::new(self.cfg.summary_root())
            .suffix_preserving()
            .resolve(&self.key())
            .into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let interpreter = inputs.get("interpreter")?.as_file()?.path().to_path_buf();
        let script = inputs.get("script")?.as_file()?.path().to_path_buf();
        let output = self.output();
        let target = output.as_file()?;

        target.with_temporary_path(|tmp| {
            ExternalProgram::new(&interpreter)
                .label("mapping summary")
                .arg(&script)
                .arg(self.cfg.manifest())
                .arg(self.cfg.output_root())
                .arg(tmp)
                .run()?;
            Ok(())
        })
    }
}

/// Transcript × sample tables of read counts and TPM, written as
/// `SummarizeCounts_count.csv` and `SummarizeCounts_tpm.csv`.
#[derive(Debug, Clone)]
pub struct SummarizeCounts {
    cfg: Arc<PipelineConfig>,
}

impl SummarizeCounts {
    pub fn new(cfg: Arc<PipelineConfig>) -> Self {
        Self { cfg }
    }
}

impl Task for SummarizeCounts {
    fn key(&self) -> TaskKey {
        manifest_key("SummarizeCounts", &self.cfg)
    }

    fn requires(&self) -> Result<Requirements> {
        per_sample_requirements(&self.cfg)
    }

    fn output(&self) -> Output {
        let key = self.key();
        let root = self.cfg.summary_root();
        TargetGroup::new()
            .with(
                "count",
                TargetOutput::new(&root).ext("_count.csv").suffix_preserving().resolve(&key),
            )
            .with(
                "tpm",
                TargetOutput::new(&root).ext("_tpm.csv").suffix_preserving().resolve(&key),
            )
            .into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let mut samples = Vec::new();
        for (id, output) in sample_inputs(inputs) {
            let path = quant_table(output)?;
            let file = fs::File::open(&path)
                .with_context(|| format!("opening quant table {}", path.display()))?;
            let records =
                read_quant(file).with_context(|| format!("reading {}", path.display()))?;
            samples.push((id.to_string(), records));
        }

        let (counts, tpm) = summarize_counts(&samples)?;
        info!(
            transcripts = counts.len(),
            samples = samples.len(),
            "summarized transcript counts"
        );

        let output = self.output();
        output
            .member("count")?
            .as_file()?
            .write_with(|w| Ok(counts.write_csv(w)?))?;
        output
            .member("tpm")?
            .as_file()?
            .write_with(|w| Ok(tpm.write_csv(w)?))?;
        Ok(())
    }
}
