//! Row-count chart over every stored table.
//!
//! One bar per table in insertion order, height proportional to its row
//! count, drawn straight onto an RGB canvas and saved as PNG. No labels:
//! the chart is a quick visual sanity check after a run, the numbers are in
//! the database.

use crate::error::ExtractorError;
use crate::store::{Store, TableRowCount};
use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::info;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const MARGIN: u32 = 50;
const GRID_LINES: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const BAR: Rgb<u8> = Rgb([31, 119, 180]);

/// Read row counts from `store` and write the chart to `path`.
pub fn write_row_count_chart(store: &Store, path: &Path) -> Result<usize, ExtractorError> {
    let counts = store.table_row_counts()?;
    let chart = draw_row_count_chart(&counts);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ExtractorError::OutputWriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    chart
        .save(path)
        .map_err(|source| ExtractorError::ImageWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        "Wrote row-count chart for {} tables to {}",
        counts.len(),
        path.display()
    );
    Ok(counts.len())
}

/// Draw the bar chart for `counts`.
pub fn draw_row_count_chart(counts: &[TableRowCount]) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let plot_left = MARGIN;
    let plot_right = WIDTH - MARGIN;
    let plot_top = MARGIN;
    let plot_bottom = HEIGHT - MARGIN;
    let plot_height = plot_bottom - plot_top;

    for i in 1..=GRID_LINES {
        let y = plot_bottom - plot_height * i / GRID_LINES;
        fill_rect(&mut img, plot_left, y, plot_right, y + 1, GRID);
    }

    let max = counts.iter().map(|c| c.rows).max().unwrap_or(0);
    if max > 0 {
        let slot = (plot_right - plot_left) as f64 / counts.len() as f64;
        let bar_width = ((slot * 0.7) as u32).max(1);
        for (i, count) in counts.iter().enumerate() {
            let bar_height = (plot_height as f64 * count.rows as f64 / max as f64).round() as u32;
            if bar_height == 0 {
                continue;
            }
            let x0 = plot_left + (slot * i as f64 + (slot - bar_width as f64) / 2.0) as u32;
            fill_rect(
                &mut img,
                x0,
                plot_bottom - bar_height,
                (x0 + bar_width).min(plot_right),
                plot_bottom,
                BAR,
            );
        }
    }

    // axes
    fill_rect(&mut img, plot_left - 2, plot_top, plot_left, plot_bottom + 2, AXIS);
    fill_rect(&mut img, plot_left - 2, plot_bottom, plot_right, plot_bottom + 2, AXIS);

    img
}

/// Fill `[x0, x1) × [y0, y1)`, clipped to the canvas.
fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, colour: Rgb<u8>) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, colour);
        }
    }
}
