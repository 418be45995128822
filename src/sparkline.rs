//! Inline sparklines for terminal output.

use crate::buckets::BucketSeries;

const TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BLANK: char = ' ';

/// Render a series past-to-present, one glyph per slot.
///
/// Glyph height is relative to the largest slot; slots with no data
/// render blank.
pub fn render_inline(series: &BucketSeries) -> String {
    let max = series.max_count();
    series
        .chronological()
        .map(|slot| match slot {
            None => BLANK,
            Some(_) if max == 0 => TICKS[0],
            Some(count) => TICKS[count * (TICKS.len() - 1) / max],
        })
        .collect()
}
