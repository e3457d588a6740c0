// tests/pipeline_end_to_end.rs

mod common;
use crate::common::fixtures::{DUMMY_ANNOTATION, DUMMY_QUANT, RnaSeqFixture};
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::Path;

use quantflow::dag::TaskRunState;
use quantflow::errors::QuantflowError;
use quantflow::pipeline::table::Matrix;
use quantflow::{BuildOptions, build, pipeline_roots, plan};
use quantflow_test_utils::builders::write_tsv;

type TestResult = Result<(), Box<dyn Error>>;

fn read_matrix(path: &Path) -> Result<Matrix, Box<dyn Error>> {
    Ok(Matrix::read_csv(fs::File::open(path)?)?)
}

#[tokio::test]
async fn pipeline_produces_gene_tables_and_figures() -> TestResult {
    init_tracing();
    let fixture = RnaSeqFixture::new(&["sample_1", "sample_2"]);
    let roots = pipeline_roots(fixture.pipeline());

    let report = build(&roots, BuildOptions::default()).await?;
    assert!(report.success(), "run failed:\n{report}");

    // Salmon had already run; nothing upstream of the quant outputs ran.
    assert_eq!(
        report.state_of_kind("SalmonQuant"),
        Some(TaskRunState::AlreadyComplete)
    );
    assert_eq!(
        report.state_of_kind("SummarizeMapping"),
        Some(TaskRunState::AlreadyComplete)
    );
    assert_eq!(report.state_of_kind("SalmonIndex"), Some(TaskRunState::Pruned));
    assert_eq!(report.state_of_kind("SummarizeCounts"), Some(TaskRunState::Done));
    assert_eq!(report.state_of_kind("CleanCounts"), Some(TaskRunState::Done));

    let summary = fixture.summary_dir();
    let count = read_matrix(&summary.join("CleanCounts_count.csv"))?;
    let tpm = read_matrix(&summary.join("CleanCounts_tpm.csv"))?;

    assert_eq!(count.index_name(), "gene_name");
    assert_eq!(count.columns(), ["sample_1", "sample_2"]);
    assert_eq!(count.get("gene_1", "sample_1"), Some(150.0));
    assert_eq!(tpm.get("gene_2", "sample_2"), Some(80.0));
    assert_eq!(count.row_names().collect::<Vec<_>>(), ["gene_1", "gene_2"]);

    let raw_count = read_matrix(&summary.join("SummarizeCounts_count.csv"))?;
    assert_eq!(raw_count.index_name(), "transcript_ID");
    assert_eq!(
        raw_count.row_names().collect::<Vec<_>>(),
        ["transcript_1", "transcript_2", "transcript_3"]
    );
    assert_eq!(raw_count.get("transcript_3", "sample_2"), Some(200.0));

    assert!(summary.join("MapFigure_rate.png").is_file());
    assert!(summary.join("MapFigure_reads.png").is_file());

    // Integral values are written without a fraction.
    let text = fs::read_to_string(summary.join("CleanCounts_count.csv"))?;
    assert!(text.contains("gene_1,150,150"), "unexpected CSV:\n{text}");

    Ok(())
}

#[tokio::test]
async fn second_run_does_no_work() -> TestResult {
    init_tracing();
    let fixture = RnaSeqFixture::new(&["sample_1", "sample_2"]);
    let roots = pipeline_roots(fixture.pipeline());

    let first = build(&roots, BuildOptions::default()).await?;
    assert!(first.success());
    assert!(first.count(TaskRunState::Done) > 0);

    let second = build(&roots, BuildOptions::default()).await?;
    assert!(second.success());
    assert_eq!(second.count(TaskRunState::Done), 0);
    assert_eq!(
        second.state_of_kind("AllReports"),
        Some(TaskRunState::AlreadyComplete)
    );
    Ok(())
}

#[tokio::test]
async fn lowly_expressed_genes_are_dropped_from_both_tables() -> TestResult {
    init_tracing();
    let mut quant = DUMMY_QUANT.to_vec();
    quant.push(("transcript_4", 3.0, 0.5));
    let mut annotation = DUMMY_ANNOTATION.to_vec();
    annotation.push(("transcript_4", "gene_3"));
    // Not annotated: dropped by the join.
    quant.push(("transcript_5", 7.0, 9.0));

    let fixture = RnaSeqFixture::with_tables(&["a", "b"], &quant, &annotation);
    let report = build(&pipeline_roots(fixture.pipeline()), BuildOptions::default()).await?;
    assert!(report.success(), "run failed:\n{report}");

    let summary = fixture.summary_dir();
    let count = read_matrix(&summary.join("CleanCounts_count.csv"))?;
    let tpm = read_matrix(&summary.join("CleanCounts_tpm.csv"))?;

    for table in [&count, &tpm] {
        assert_eq!(table.row_names().collect::<Vec<_>>(), ["gene_1", "gene_2"]);
    }
    Ok(())
}

#[tokio::test]
async fn malformed_quant_fails_its_branch_only() -> TestResult {
    init_tracing();
    let fixture = RnaSeqFixture::new(&["sample_1", "sample_2"]);
    // sample_2 lacks transcript_3.
    write_tsv(
        &fixture
            .data_root()
            .join("output")
            .join("sample_2")
            .join("quant.sf"),
        &["Name", "TPM", "NumReads"],
        &[
            vec!["transcript_1".into(), "20".into(), "50".into()],
            vec!["transcript_2".into(), "40".into(), "100".into()],
        ],
    );

    let report = build(&pipeline_roots(fixture.pipeline()), BuildOptions::default()).await?;
    assert!(!report.success());

    assert_eq!(report.state_of_kind("SummarizeCounts"), Some(TaskRunState::Failed));
    assert_eq!(
        report.state_of_kind("CleanCounts"),
        Some(TaskRunState::UpstreamFailed)
    );
    assert_eq!(
        report.state_of_kind("AllReports"),
        Some(TaskRunState::UpstreamFailed)
    );
    // The figures do not depend on the counts.
    assert_eq!(report.state_of_kind("MapFigure"), Some(TaskRunState::Done));

    let failed = report
        .tasks
        .iter()
        .find(|t| t.state == TaskRunState::Failed)
        .expect("a failed task");
    let error = failed.error.as_deref().unwrap_or_default();
    assert!(error.contains("transcript_3"), "error was: {error}");

    assert!(!fixture.summary_dir().join("SummarizeCounts_count.csv").exists());
    assert!(!fixture.summary_dir().join("CleanCounts_count.csv").exists());
    Ok(())
}

#[test]
fn missing_annotation_is_reported_before_running() {
    init_tracing();
    let fixture = RnaSeqFixture::new(&["sample_1"]);
    let annotation = fixture.data_root().join("annotation.tsv");
    fs::remove_file(&annotation).expect("remove annotation");

    match plan(&pipeline_roots(fixture.pipeline())) {
        Err(QuantflowError::MissingInputs(paths)) => assert_eq!(paths, vec![annotation]),
        other => panic!("expected MissingInputs, got {other:?}"),
    }
    assert!(!fixture.summary_dir().join("SummarizeCounts_count.csv").exists());
}

#[test]
fn missing_interpreter_is_reported_before_running() {
    init_tracing();
    let fixture = RnaSeqFixture::new(&["sample_1", "sample_2"]);
    let interpreter = fixture.root().join("bin").join("perl");
    let pipeline = |fixture: &RnaSeqFixture| {
        let cfg = quantflow_test_utils::builders::ConfigFileBuilder::new()
            .data_root(fixture.data_root())
            .interpreter(&interpreter)
            .build();
        quantflow::pipeline::PipelineConfig::new(cfg, fixture.manifest())
    };

    // With the mapping summary already present the interpreter is not needed.
    assert!(plan(&pipeline_roots(pipeline(&fixture))).is_ok());

    fs::remove_file(fixture.summary_dir().join("SummarizeMapping.txt"))
        .expect("remove mapping summary");
    let scripts = fixture.data_root().join("scripts");
    fs::create_dir_all(&scripts).expect("create scripts dir");
    fs::write(scripts.join("get_salmon_summary.pl"), "").expect("write script");
    match plan(&pipeline_roots(pipeline(&fixture))) {
        Err(QuantflowError::MissingInputs(paths)) => assert_eq!(paths, vec![interpreter.clone()]),
        other => panic!("expected MissingInputs, got {other:?}"),
    }
    assert!(!fixture.summary_dir().join("SummarizeCounts_count.csv").exists());
}

#[test]
fn fresh_data_root_needs_salmon_and_reads() {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = dir.path().join("samples.txt");
    fs::write(&manifest, "s1\n").expect("write manifest");

    let cfg = quantflow_test_utils::builders::ConfigFileBuilder::new()
        .data_root(dir.path().join("data"))
        .salmon_program(dir.path().join("bin").join("salmon"))
        .build();
    let pipeline = quantflow::pipeline::PipelineConfig::new(cfg, &manifest);

    let err = plan(&pipeline_roots(pipeline)).expect_err("inputs are missing");
    let QuantflowError::MissingInputs(paths) = err else {
        panic!("expected MissingInputs, got {err:?}");
    };
    let data = dir.path().join("data");
    for expected in [
        dir.path().join("bin").join("salmon"),
        data.join("reference").join("transcripts.fa"),
        data.join("fastq").join("s1_R1.fastq.gz"),
        data.join("fastq").join("s1_R2.fastq.gz"),
        data.join("annotation.tsv"),
        data.join("scripts").join("get_salmon_summary.pl"),
    ] {
        assert!(paths.contains(&expected), "{expected:?} not in {paths:?}");
    }
}
