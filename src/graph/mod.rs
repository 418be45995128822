//! PNG bar-chart trend images.
//!
//! The chart is small enough to paste into a chat or issue: a fixed
//! 256×64 canvas with one bar per time bucket and three labels drawn in the
//! embedded bitmap font.

pub mod font;

use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::buckets::BucketSeries;
use font::{glyph_for, string_width};

pub const WIDTH: u32 = 256;
pub const HEIGHT: u32 = 64;

/// Horizontal space left free around the bars
const MARGIN: u32 = 4;
/// Space between neighbouring bars
const GAP: u32 = 2;
/// Bottom edge of every bar
const BASELINE: u32 = HEIGHT - 8;
/// Tallest possible bar, leaving room for the top label
const MAX_BAR_HEIGHT: u32 = BASELINE - 7;

const BACKGROUND: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
const TEXT: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const BAR_FILL: Rgba<u8> = Rgba([0xFF, 0x00, 0x00, 0xFF]);
const BAR_STROKE: Rgba<u8> = Rgba([0xFF, 0xFF, 0x00, 0xFF]);

/// Error types for graph output
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Failed to write image {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Horizontal placement of the bars
#[derive(Debug, Clone, Copy, PartialEq)]
struct BarLayout {
    /// Left edge of the first bar
    start: f64,
    /// Distance between the left edges of neighbouring bars
    step: f64,
    bar_width: u32,
}

impl BarLayout {
    fn new(bars: usize) -> Self {
        let bars = bars.max(1) as f64;
        let step = (f64::from(WIDTH - MARGIN) / bars).max(1.0);
        let bar_width = (step - f64::from(GAP)).max(0.0) as u32;
        let span = step * bars;
        let start = (f64::from(WIDTH) - span) / 2.0 + (step - f64::from(bar_width)) / 2.0;
        Self {
            start,
            step,
            bar_width,
        }
    }

    fn left(&self, index: usize) -> u32 {
        (self.start + self.step * index as f64) as u32
    }
}

/// Draw a series as a bar chart, past on the left.
///
/// Every slot keeps its place on the time axis. Slots older than the data
/// sample are left blank, so a young error does not show a run of false
/// zeros.
pub fn render_image(series: &BucketSeries, left_label: &str, right_label: &str) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let max = series.max_count();
    write_string(&mut image, 1, 1, TEXT, &format!("MAX {max}"));
    write_string(&mut image, 1, HEIGHT - 6, TEXT, left_label);
    let right_x = (WIDTH - 1).saturating_sub(string_width(right_label));
    write_string(&mut image, right_x, HEIGHT - 6, TEXT, right_label);

    let layout = BarLayout::new(series.slot_count);
    for (i, slot) in series.chronological().enumerate() {
        let Some(count) = slot else {
            continue;
        };
        draw_bar(&mut image, layout.left(i), layout.bar_width, bar_height(count, max));
    }

    image
}

/// Save an image as PNG
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), GraphError> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| GraphError::Write {
            path: path.display().to_string(),
            source,
        })
}

fn bar_height(count: usize, max: usize) -> u32 {
    if max == 0 {
        return 0;
    }
    (f64::from(MAX_BAR_HEIGHT) * (count as f64 / max as f64)) as u32
}

fn draw_bar(image: &mut RgbaImage, x: u32, width: u32, height: u32) {
    if width == 0 || height == 0 {
        return;
    }
    let top = BASELINE + 1 - height;
    let right = x + width - 1;
    for y in top..=BASELINE {
        for px in x..=right {
            let edge = y == top || y == BASELINE || px == x || px == right;
            plot(image, px, y, if edge { BAR_STROKE } else { BAR_FILL });
        }
    }
}

fn plot(image: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}

/// Draw one character with its top-left corner at (x, y); returns the advance
fn draw_character(image: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, c: char) -> u32 {
    let glyph = glyph_for(c);
    for (dy, row) in glyph.rows.iter().enumerate() {
        let mut bits = *row;
        let mut dx = 0;
        while bits > 0 {
            if bits & 1 != 0 {
                plot(image, x + dx, y + dy as u32, color);
            }
            bits >>= 1;
            dx += 1;
        }
    }
    glyph.width
}

/// Draw a string left to right; returns its total pixel width
fn write_string(image: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, text: &str) -> u32 {
    text.chars()
        .fold(0, |pen, c| pen + draw_character(image, x + pen, y, color, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(chronological: &[Option<usize>]) -> BucketSeries {
        let slots: Vec<Option<usize>> = chronological.iter().rev().copied().collect();
        BucketSeries {
            slot_count: slots.len(),
            slots,
            interval_seconds: 3600,
        }
    }

    fn lit(image: &RgbaImage, x: u32, y: u32) -> bool {
        *image.get_pixel(x, y) != BACKGROUND
    }

    /// Height of the drawn bar at column x, measured from the baseline up
    fn measured_height(image: &RgbaImage, x: u32) -> u32 {
        (0..=MAX_BAR_HEIGHT)
            .take_while(|dy| lit(image, x, BASELINE - dy))
            .count() as u32
    }

    fn bar_center(bars: usize, index: usize) -> u32 {
        let layout = BarLayout::new(bars);
        layout.left(index) + layout.bar_width / 2
    }

    #[test]
    fn test_canvas_size() {
        let image = render_image(&series(&[Some(1)]), "", "");
        assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_bar_heights_follow_counts() {
        let counts = [3, 9, 0, 5, 1, 7];
        let slots: Vec<Option<usize>> = counts.iter().map(|c| Some(*c)).collect();
        let image = render_image(&series(&slots), "", "");

        let heights: Vec<u32> = (0..counts.len())
            .map(|i| measured_height(&image, bar_center(counts.len(), i)))
            .collect();

        for i in 0..counts.len() {
            for j in 0..counts.len() {
                if counts[i] > counts[j] {
                    assert!(heights[i] > heights[j], "{counts:?} -> {heights:?}");
                }
            }
        }
        assert_eq!(heights[1], MAX_BAR_HEIGHT);
        assert_eq!(heights[2], 0);
    }

    #[test]
    fn test_single_bucket_is_centered() {
        let image = render_image(&series(&[Some(4)]), "", "");
        let layout = BarLayout::new(1);
        let left = layout.left(0);
        let right = left + layout.bar_width - 1;
        assert_eq!(left, WIDTH - 1 - right);
        assert_eq!(measured_height(&image, WIDTH / 2), MAX_BAR_HEIGHT);
    }

    #[test]
    fn test_empty_slots_keep_their_place_on_the_time_axis() {
        let mut slots = vec![None; 12];
        slots.extend((1..=12).map(Some));
        let image = render_image(&series(&slots), "", "");

        let layout = BarLayout::new(24);
        let first_lit = (0..WIDTH).find(|x| lit(&image, *x, BASELINE)).unwrap();
        assert_eq!(first_lit, layout.left(12));
        assert!(first_lit > WIDTH / 2 - layout.step as u32);
    }

    #[test]
    fn test_empty_slots_are_blank() {
        let image = render_image(&series(&[None, None, Some(2), Some(4)]), "", "");
        assert_eq!(measured_height(&image, bar_center(4, 0)), 0);
        assert_eq!(measured_height(&image, bar_center(4, 1)), 0);
        assert!(measured_height(&image, bar_center(4, 2)) > 0);
        assert_eq!(measured_height(&image, bar_center(4, 3)), MAX_BAR_HEIGHT);
    }

    #[test]
    fn test_empty_series_renders_labels_only() {
        let image = render_image(&series(&[]), "", "");
        for x in 0..WIDTH {
            assert!(!lit(&image, x, BASELINE));
        }
        // "MAX 0" in the top-left corner
        assert!((0..WIDTH).any(|x| lit(&image, x, 1)));
    }

    #[test]
    fn test_all_zero_series_draws_no_bars() {
        let image = render_image(&series(&[Some(0), Some(0)]), "", "");
        assert_eq!(measured_height(&image, bar_center(2, 0)), 0);
        assert_eq!(measured_height(&image, bar_center(2, 1)), 0);
    }

    #[test]
    fn test_write_string_advances_by_glyph_width() {
        let mut image = RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        assert_eq!(write_string(&mut image, 0, 0, TEXT, "I I"), 4 + 5 + 4);
    }

    #[test]
    fn test_unsupported_character_keeps_following_glyphs_aligned() {
        let mut mixed = RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        let width = write_string(&mut mixed, 10, 10, TEXT, "A~B");
        assert_eq!(width, 6 + 5 + 6);

        let mut expected = RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        write_string(&mut expected, 10, 10, TEXT, "A?B");
        assert_eq!(mixed, expected);
    }

    #[test]
    fn test_right_label_is_right_aligned() {
        let image = render_image(&series(&[]), "", "NOW");
        let last_lit = (0..WIDTH)
            .filter(|x| (HEIGHT - 6..HEIGHT - 1).any(|y| lit(&image, *x, y)))
            .max()
            .unwrap();
        // the trailing column of each glyph is spacing
        assert_eq!(last_lit, WIDTH - 3);
    }

    #[test]
    fn test_save_png_round_trip() {
        let image = render_image(&series(&[Some(1), Some(2)]), "24H AGO", "NOW");
        let path = std::env::temp_dir().join(format!("airbrake-tools-{}.png", std::process::id()));
        save_png(&image, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, image);
    }
}
