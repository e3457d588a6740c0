// src/pipeline/table.rs

//! Tabular operations behind the summary and cleaning stages.
//!
//! Tables are small (one row per transcript or gene, one column per
//! sample), so everything is held in memory as a [`Matrix`] of `f64`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};

use serde::Deserialize;

use crate::errors::{QuantflowError, Result};

/// Genes whose mean TPM across samples is at or below this are dropped from
/// the cleaned tables.
pub const MIN_MEAN_TPM: f64 = 0.5;

pub const TRANSCRIPT_COLUMN: &str = "transcript_ID";
pub const GENE_COLUMN: &str = "gene_name";

/// One row of salmon's `quant.sf`. Other columns are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuantRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "NumReads")]
    pub num_reads: f64,
    #[serde(rename = "TPM")]
    pub tpm: f64,
}

/// One row of the annotation table. `transcript_length` is not needed and is
/// not read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotationRecord {
    #[serde(rename = "transcript_ID")]
    pub transcript_id: String,
    #[serde(rename = "gene_name")]
    pub gene_name: String,
}

/// One row of the mapping summary written by the mapping script.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRow {
    pub sample: String,
    pub mapped_reads: f64,
    pub mapped_rate: f64,
}

#[derive(Debug, Deserialize)]
struct RawMappingRow {
    #[serde(rename = "Sample")]
    sample: String,
    #[serde(rename = "Mapped_Reads")]
    mapped_reads: String,
    #[serde(rename = "Mapped_Rate")]
    mapped_rate: String,
}

/// A labelled numeric table: a named index column plus one `f64` column per
/// sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    index_name: String,
    columns: Vec<String>,
    rows: Vec<(String, Vec<f64>)>,
}

impl Matrix {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.columns.len() {
            return Err(QuantflowError::MalformedTable(format!(
                "row {name:?} has {} values, expected {}",
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push((name, values));
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.rows.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.row(row).map(|values| values[col])
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.rows.retain(|(name, _)| keep(name));
    }

    /// Parse a comma-separated table whose first column is the index.
    pub fn read_csv(reader: impl Read) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers().map_err(malformed("table header"))?.clone();
        let mut fields = headers.iter();
        let index_name = fields
            .next()
            .ok_or_else(|| QuantflowError::MalformedTable("table has no columns".to_string()))?;
        let mut matrix = Matrix::new(index_name, fields.map(str::to_string).collect());

        for record in csv.records() {
            let record = record.map_err(malformed("table row"))?;
            let mut fields = record.iter();
            let name = fields.next().unwrap_or_default().to_string();
            let values = fields
                .zip(&matrix.columns)
                .map(|(value, column)| parse_number(column, value))
                .collect::<Result<Vec<_>>>()?;
            matrix.push_row(name, values)?;
        }

        Ok(matrix)
    }

    /// Write the table as CSV: index column first, then the sample columns.
    pub fn write_csv(&self, writer: impl Write) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let header = std::iter::once(self.index_name.as_str())
            .chain(self.columns.iter().map(String::as_str));
        csv.write_record(header).map_err(write_error)?;

        for (name, values) in &self.rows {
            let record = std::iter::once(name.clone()).chain(values.iter().map(|v| format_number(*v)));
            csv.write_record(record).map_err(write_error)?;
        }

        csv.flush()?;
        Ok(())
    }
}

/// Shortest round-trip rendering; integral values print without a fraction.
pub fn format_number(value: f64) -> String {
    value.to_string()
}

/// Read a tab-separated `quant.sf`.
pub fn read_quant(reader: impl Read) -> Result<Vec<QuantRecord>> {
    tsv_reader(reader)
        .deserialize()
        .collect::<std::result::Result<Vec<QuantRecord>, _>>()
        .map_err(malformed("quant table"))
}

/// Read the tab-separated annotation table.
pub fn read_annotation(reader: impl Read) -> Result<Vec<AnnotationRecord>> {
    tsv_reader(reader)
        .deserialize()
        .collect::<std::result::Result<Vec<AnnotationRecord>, _>>()
        .map_err(malformed("annotation table"))
}

/// Read the tab-separated mapping summary. Rates may carry a trailing `%`.
pub fn read_mapping_summary(reader: impl Read) -> Result<Vec<MappingRow>> {
    let raw = tsv_reader(reader)
        .deserialize()
        .collect::<std::result::Result<Vec<RawMappingRow>, _>>()
        .map_err(malformed("mapping summary"))?;

    raw.into_iter()
        .map(|row| {
            Ok(MappingRow {
                mapped_reads: parse_number("Mapped_Reads", &row.mapped_reads)?,
                mapped_rate: parse_number("Mapped_Rate", &row.mapped_rate)?,
                sample: row.sample,
            })
        })
        .collect()
}

/// Merge per-sample quant tables into transcript × sample count and TPM
/// tables.
///
/// Rows follow the first sample's transcript order; other samples are
/// aligned by transcript name and must contain every transcript of the
/// first.
pub fn summarize_counts(samples: &[(String, Vec<QuantRecord>)]) -> Result<(Matrix, Matrix)> {
    let Some((_, first)) = samples.first() else {
        return Err(QuantflowError::MalformedTable(
            "no samples to summarize".to_string(),
        ));
    };

    let columns: Vec<String> = samples.iter().map(|(id, _)| id.clone()).collect();
    let lookups: Vec<HashMap<&str, &QuantRecord>> = samples
        .iter()
        .map(|(_, records)| records.iter().map(|r| (r.name.as_str(), r)).collect())
        .collect();

    let mut counts = Matrix::new(TRANSCRIPT_COLUMN, columns.clone());
    let mut tpm = Matrix::new(TRANSCRIPT_COLUMN, columns);

    for transcript in first {
        let mut count_row = Vec::with_capacity(samples.len());
        let mut tpm_row = Vec::with_capacity(samples.len());
        for ((id, _), lookup) in samples.iter().zip(&lookups) {
            let record = lookup.get(transcript.name.as_str()).ok_or_else(|| {
                QuantflowError::MalformedTable(format!(
                    "sample {id} has no row for transcript {:?}",
                    transcript.name
                ))
            })?;
            count_row.push(record.num_reads);
            tpm_row.push(record.tpm);
        }
        counts.push_row(transcript.name.clone(), count_row)?;
        tpm.push_row(transcript.name.clone(), tpm_row)?;
    }

    Ok((counts, tpm))
}

/// Inner-join a transcript table with the annotation and sum per gene.
///
/// Transcripts without an annotation are dropped; genes come out sorted.
pub fn aggregate_by_gene(annotation: &[AnnotationRecord], transcripts: &Matrix) -> Result<Matrix> {
    let mut genes_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in annotation {
        genes_of
            .entry(record.transcript_id.as_str())
            .or_default()
            .push(record.gene_name.as_str());
    }

    let width = transcripts.columns().len();
    let mut sums: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (transcript, values) in transcripts.rows() {
        let Some(genes) = genes_of.get(transcript) else {
            continue;
        };
        for gene in genes {
            let acc = sums.entry(*gene).or_insert_with(|| vec![0.0; width]);
            for (slot, value) in acc.iter_mut().zip(values) {
                *slot += value;
            }
        }
    }

    let mut genes = Matrix::new(GENE_COLUMN, transcripts.columns().to_vec());
    for (gene, values) in sums {
        genes.push_row(gene, values)?;
    }
    Ok(genes)
}

/// Rows whose mean across all columns is strictly above `min_mean`.
pub fn expressed_rows(table: &Matrix, min_mean: f64) -> BTreeSet<String> {
    table
        .rows()
        .filter(|(_, values)| {
            !values.is_empty() && values.iter().sum::<f64>() / values.len() as f64 > min_mean
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Gene-level count and TPM tables restricted to expressed genes.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTables {
    pub count: Matrix,
    pub tpm: Matrix,
}

/// Aggregate both transcript tables by gene and keep the genes whose mean
/// TPM is above [`MIN_MEAN_TPM`], in both tables.
pub fn clean_counts(
    annotation: &[AnnotationRecord],
    transcript_counts: &Matrix,
    transcript_tpm: &Matrix,
) -> Result<CleanTables> {
    let mut count = aggregate_by_gene(annotation, transcript_counts)?;
    let mut tpm = aggregate_by_gene(annotation, transcript_tpm)?;

    let keep = expressed_rows(&tpm, MIN_MEAN_TPM);
    count.retain_rows(|gene| keep.contains(gene));
    tpm.retain_rows(|gene| keep.contains(gene));

    Ok(CleanTables { count, tpm })
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn parse_number(column: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    number.parse::<f64>().map_err(|_| {
        QuantflowError::MalformedTable(format!("column {column}: {value:?} is not a number"))
    })
}

fn malformed(what: &'static str) -> impl Fn(csv::Error) -> QuantflowError {
    move |e| QuantflowError::MalformedTable(format!("{what}: {e}"))
}

fn write_error(e: csv::Error) -> QuantflowError {
    QuantflowError::Other(anyhow::Error::new(e).context("writing CSV"))
}
