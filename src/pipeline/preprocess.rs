// src/pipeline/preprocess.rs

//! QC figures and gene-level tables.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::errors::Result;
use crate::target::{Output, TargetGroup};
use crate::task::{Inputs, Requirements, Task, TaskKey, TargetOutput};

use super::inputs::annotation_file;
use super::plot::write_bar_chart;
use super::table::{MappingRow, Matrix, clean_counts, read_annotation, read_mapping_summary};
use super::{PipelineConfig, SummarizeCounts, SummarizeMapping};

/// Bar charts of mapping rate and mapped reads per sample.
///
/// Bars run left to right in manifest order. Rows of the mapping summary
/// for samples not in the manifest follow, in file order.
#[derive(Debug, Clone)]
pub struct MapFigure {
    cfg: Arc<PipelineConfig>,
}

impl MapFigure {
    pub fn new(cfg: Arc<PipelineConfig>) -> Self {
        Self { cfg }
    }
}

impl Task for MapFigure {
    fn key(&self) -> TaskKey {
        TaskKey::new("MapFigure").path_param("manifest", self.cfg.manifest())
    }

    fn requires(&self) -> Result<Requirements> {
        Ok(Requirements::new().with("sum_map", SummarizeMapping::new(self.cfg.clone())))
    }

    fn output(&self) -> Output {
        let key = self.key();
        let root = self.cfg.summary_root();
        TargetGroup::new()
            .with(
                "rate",
                TargetOutput::new(&root).ext("_rate.png").suffix_preserving().resolve(&key),
            )
            .with(
                "reads",
                TargetOutput::new(&root).ext("_reads.png").suffix_preserving().resolve(&key),
            )
            .into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let summary = inputs.get("sum_map")?.as_file()?;
        let rows = read_mapping_summary(summary.open_read()?)
            .with_context(|| format!("reading {}", summary.path().display()))?;

        let rows = order_by_samples(rows, &self.cfg.sample_ids()?);
        let rates: Vec<(String, f64)> = rows
            .iter()
            .map(|r| (r.sample.clone(), r.mapped_rate))
            .collect();
        let reads: Vec<(String, f64)> = rows
            .iter()
            .map(|r| (r.sample.clone(), r.mapped_reads))
            .collect();

        let output = self.output();
        write_bar_chart(output.member("rate")?.as_file()?, &rates)?;
        write_bar_chart(output.member("reads")?.as_file()?, &reads)?;

        info!(samples = rows.len(), "mapping figures written");
        Ok(())
    }
}

/// Sort mapping rows into the order of `samples`. The sort is stable, so
/// rows for unknown samples keep their relative order at the end.
pub fn order_by_samples(mut rows: Vec<MappingRow>, samples: &[String]) -> Vec<MappingRow> {
    rows.sort_by_key(|row| {
        samples
            .iter()
            .position(|id| *id == row.sample)
            .unwrap_or(samples.len())
    });
    rows
}

/// Gene-level count and TPM tables.
///
/// Transcripts are mapped to genes through the annotation, summed per gene,
/// and genes with mean TPM at or below the expression cutoff are dropped
/// from both tables.
#[derive(Debug, Clone)]
pub struct CleanCounts {
    cfg: Arc<PipelineConfig>,
}

impl CleanCounts {
    pub fn new(cfg: Arc<PipelineConfig>) -> Self {
        Self { cfg }
    }
}

impl Task for CleanCounts {
    fn key(&self) -> TaskKey {
        TaskKey::new("CleanCounts").path_param("manifest", self.cfg.manifest())
    }

    fn requires(&self) -> Result<Requirements> {
        Ok(Requirements::new()
            .with("map_fig", MapFigure::new(self.cfg.clone()))
            .with("annotation", annotation_file(&self.cfg))
            .with("raw_counts", SummarizeCounts::new(self.cfg.clone())))
    }

    fn output(&self) -> Output {
        let key = self.key();
        let root = self.cfg.summary_root();
        TargetGroup::new()
            .with(
                "tpm",
                TargetOutput::new(&root).ext("_tpm.csv").suffix_preserving().resolve(&key),
            )
            .with(
                "count",
                TargetOutput::new(&root).ext("_count.csv").suffix_preserving().resolve(&key),
            )
            .into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let annotation_target = inputs.get("annotation")?.as_file()?;
        let annotation = read_annotation(annotation_target.open_read()?)
            .with_context(|| format!("reading {}", annotation_target.path().display()))?;

        let raw = inputs.get("raw_counts")?;
        let read_table = |name: &str| -> anyhow::Result<Matrix> {
            let target = raw.member(name)?.as_file()?;
            Matrix::read_csv(target.open_read()?)
                .with_context(|| format!("reading {}", target.path().display()))
        };
        let count = read_table("count")?;
        let tpm = read_table("tpm")?;

        let clean = clean_counts(&annotation, &count, &tpm)?;
        info!(
            genes = clean.tpm.len(),
            "gene tables cleaned"
        );

        let output = self.output();
        output
            .member("count")?
            .as_file()?
            .write_with(|w| Ok(clean.count.write_csv(w)?))?;
        output
            .member("tpm")?
            .as_file()?
            .write_with(|w| Ok(clean.tpm.write_csv(w)?))?;
        Ok(())
    }
}
