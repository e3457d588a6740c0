// tests/map_figure.rs

mod common;
use crate::common::fixtures::RnaSeqFixture;
use crate::common::init_tracing;

use std::error::Error;

use image::Rgb;
use quantflow::pipeline::plot::render_bar_chart;
use quantflow::pipeline::preprocess::order_by_samples;
use quantflow::pipeline::table::MappingRow;
use quantflow::{BuildOptions, build, pipeline_roots};
use quantflow_test_utils::builders::write_tsv;

type TestResult = Result<(), Box<dyn Error>>;

fn row(sample: &str, mapped_reads: f64) -> MappingRow {
    MappingRow {
        sample: sample.to_string(),
        mapped_reads,
        mapped_rate: 90.0,
    }
}

fn labelled(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs.iter().map(|(l, v)| (l.to_string(), *v)).collect()
}

#[test]
fn rows_follow_manifest_order_with_unknown_samples_last() {
    let rows = vec![row("c", 3.0), row("stray", 9.0), row("a", 1.0), row("b", 2.0)];
    let samples = ["a", "b", "c"].map(String::from);

    let ordered = order_by_samples(rows, &samples);
    let names: Vec<&str> = ordered.iter().map(|r| r.sample.as_str()).collect();
    assert_eq!(names, ["a", "b", "c", "stray"]);
}

#[test]
fn bars_are_laid_out_left_to_right_in_input_order() {
    let chart = render_bar_chart(&labelled(&[("a", 10.0), ("b", 40.0), ("c", 20.0)]));

    let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["a", "b", "c"]);
    assert!(chart.bars.windows(2).all(|w| w[0].left < w[1].left));

    let heights: Vec<u32> = chart.bars.iter().map(|b| b.height).collect();
    assert_eq!(heights[1], 320);
    assert_eq!(heights[0] * 4, heights[1]);
    assert_eq!(heights[2] * 2, heights[1]);

    // Each bar's column holds its own height plus the two-pixel x axis.
    let white = Rgb([255, 255, 255]);
    for bar in &chart.bars {
        let painted = (0..chart.image.height())
            .filter(|&y| *chart.image.get_pixel(bar.left + 1, y) != white)
            .count() as u32;
        assert_eq!(painted, bar.height + 2, "bar {}", bar.label);
    }
}

#[test]
fn empty_and_negative_values_draw_no_bar() {
    let chart = render_bar_chart(&labelled(&[("a", -1.0), ("b", f64::NAN), ("c", 0.0)]));
    assert!(chart.bars.iter().all(|b| b.height == 0));
    assert!(render_bar_chart(&[]).bars.is_empty());
}

#[tokio::test]
async fn figures_use_manifest_order_not_summary_order() -> TestResult {
    init_tracing();
    let fixture = RnaSeqFixture::new(&["sample_1", "sample_2", "sample_3"]);
    let summary = fixture.summary_dir().join("SummarizeMapping.txt");
    write_tsv(
        &summary,
        &["Sample", "Mapped_Reads", "Mapped_Rate"],
        &[
            vec!["sample_3".into(), "3000".into(), "70%".into()],
            vec!["sample_1".into(), "1000".into(), "90%".into()],
            vec!["sample_2".into(), "2000".into(), "80%".into()],
        ],
    );

    let report = build(&pipeline_roots(fixture.pipeline()), BuildOptions::default()).await?;
    assert!(report.success(), "{report}");

    let figures = fixture.summary_dir();
    let reads = image::open(figures.join("MapFigure_reads.png"))?.to_rgb8();
    let expected = render_bar_chart(&labelled(&[
        ("sample_1", 1000.0),
        ("sample_2", 2000.0),
        ("sample_3", 3000.0),
    ]));
    assert!(reads == expected.image, "reads figure is not in manifest order");

    let rate = image::open(figures.join("MapFigure_rate.png"))?.to_rgb8();
    let expected = render_bar_chart(&labelled(&[
        ("sample_1", 90.0),
        ("sample_2", 80.0),
        ("sample_3", 70.0),
    ]));
    assert!(rate == expected.image, "rate figure is not in manifest order");
    Ok(())
}
