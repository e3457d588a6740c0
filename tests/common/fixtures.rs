use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use quantflow::pipeline::{PipelineConfig, QUANT_TABLE};
use quantflow::target::SUCCESS_FLAG;
use quantflow_test_utils::builders::{ConfigFileBuilder, write_manifest, write_tsv};

/// `(transcript, NumReads, TPM)` rows shared by every sample.
pub const DUMMY_QUANT: &[(&str, f64, f64)] = &[
    ("transcript_1", 50.0, 20.0),
    ("transcript_2", 100.0, 40.0),
    ("transcript_3", 200.0, 80.0),
];

/// `(transcript, gene)` rows of the annotation.
pub const DUMMY_ANNOTATION: &[(&str, &str)] = &[
    ("transcript_1", "gene_1"),
    ("transcript_2", "gene_1"),
    ("transcript_3", "gene_2"),
];

/// A data directory in which salmon has already run for every sample and
/// the mapping summary exists, so only the in-process stages are left.
pub struct RnaSeqFixture {
    pub dir: TempDir,
    pub samples: Vec<String>,
}

impl RnaSeqFixture {
    pub fn new(samples: &[&str]) -> Self {
        Self::with_tables(samples, DUMMY_QUANT, DUMMY_ANNOTATION)
    }

    pub fn with_tables(
        samples: &[&str],
        quant: &[(&str, f64, f64)],
        annotation: &[(&str, &str)],
    ) -> Self {
        let fixture = Self {
            dir: TempDir::new().expect("create fixture dir"),
            samples: samples.iter().map(|s| s.to_string()).collect(),
        };

        write_manifest(&fixture.manifest(), samples);

        for id in samples {
            let sample_dir = fixture.data_root().join("output").join(id);
            let rows = quant
                .iter()
                .map(|(name, reads, tpm)| {
                    vec![
                        name.to_string(),
                        "1000".to_string(),
                        "900.0".to_string(),
                        tpm.to_string(),
                        reads.to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            write_tsv(
                &sample_dir.join(QUANT_TABLE),
                &["Name", "Length", "EffectiveLength", "TPM", "NumReads"],
                &rows,
            );
            std::fs::write(sample_dir.join(SUCCESS_FLAG), "").expect("write quant flag");
        }

        let annotation_rows = annotation
            .iter()
            .map(|(tx, gene)| vec![tx.to_string(), "1000".to_string(), gene.to_string()])
            .collect::<Vec<_>>();
        write_tsv(
            &fixture.data_root().join("annotation.tsv"),
            &["transcript_ID", "transcript_length", "gene_name"],
            &annotation_rows,
        );

        let mapping_rows = samples
            .iter()
            .enumerate()
            .map(|(i, id)| {
                vec![
                    id.to_string(),
                    (1000 * (i + 1)).to_string(),
                    format!("{}%", 80 + i),
                ]
            })
            .collect::<Vec<_>>();
        write_tsv(
            &fixture.summary_dir().join("SummarizeMapping.txt"),
            &["Sample", "Mapped_Reads", "Mapped_Rate"],
            &mapping_rows,
        );

        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_root(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn summary_dir(&self) -> PathBuf {
        self.data_root().join("summary")
    }

    pub fn manifest(&self) -> PathBuf {
        self.root().join("samples.txt")
    }

    pub fn pipeline(&self) -> Arc<PipelineConfig> {
        let cfg = ConfigFileBuilder::new()
            .data_root(self.data_root())
            .build();
        PipelineConfig::new(cfg, self.manifest())
    }
}
