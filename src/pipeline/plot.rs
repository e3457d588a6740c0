// src/pipeline/plot.rs

//! Minimal bar-chart renderer for the mapping QC figures.

use anyhow::Context;
use image::{Rgb, RgbImage};
use tracing::debug;

use crate::target::LocalTarget;

const PLOT_HEIGHT: u32 = 320;
const MARGIN: u32 = 40;
const BAR_WIDTH: u32 = 48;
const BAR_GAP: u32 = 16;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);

/// Fill colours, cycled per bar.
const PALETTE: [Rgb<u8>; 6] = [
    Rgb([76, 114, 176]),
    Rgb([221, 132, 82]),
    Rgb([85, 168, 104]),
    Rgb([196, 78, 82]),
    Rgb([129, 114, 179]),
    Rgb([147, 120, 96]),
];

/// Where one bar landed in a rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub label: String,
    /// Left edge in pixels.
    pub left: u32,
    /// Bar height in pixels, measured up from the baseline.
    pub height: u32,
}

/// A rendered chart plus the position of every bar.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub image: RgbImage,
    pub bars: Vec<BarLayout>,
}

/// Render one bar per `(label, value)` pair, left to right in the order
/// given, scaled so the largest value fills the plot height. Negative and
/// non-finite values draw as empty bars.
pub fn render_bar_chart(bars: &[(String, f64)]) -> BarChart {
    let count = bars.len() as u32;
    let width = 2 * MARGIN + count.max(1) * (BAR_WIDTH + BAR_GAP) + BAR_GAP;
    let height = PLOT_HEIGHT + 2 * MARGIN;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let max = bars
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    let baseline = MARGIN + PLOT_HEIGHT;
    let mut layout = Vec::with_capacity(bars.len());
    for (i, (label, value)) in bars.iter().enumerate() {
        let scaled = if max > 0.0 && value.is_finite() && *value > 0.0 {
            ((value / max) * f64::from(PLOT_HEIGHT)).round() as u32
        } else {
            0
        };
        let left = MARGIN + BAR_GAP + i as u32 * (BAR_WIDTH + BAR_GAP);
        let colour = PALETTE[i % PALETTE.len()];
        fill_rect(&mut img, left, baseline - scaled, BAR_WIDTH, scaled, colour);
        layout.push(BarLayout {
            label: label.clone(),
            left,
            height: scaled,
        });
    }

    // Axes.
    fill_rect(&mut img, MARGIN, MARGIN, 2, PLOT_HEIGHT, AXIS);
    fill_rect(&mut img, MARGIN, baseline, width - 2 * MARGIN, 2, AXIS);

    BarChart {
        image: img,
        bars: layout,
    }
}

/// Render and atomically publish a bar chart. The encoding is picked from
/// the target's extension, so `target` should be suffix-preserving.
pub fn write_bar_chart(target: &LocalTarget, bars: &[(String, f64)]) -> anyhow::Result<()> {
    let chart = render_bar_chart(bars);
    let order: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
    debug!(path = %target.path().display(), bars = ?order, "bar chart rendered");
    target.with_temporary_path(|tmp| {
        chart
            .image
            .save(tmp)
            .with_context(|| format!("encoding bar chart for {}", target.path().display()))
    })
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, colour: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, colour);
        }
    }
}
