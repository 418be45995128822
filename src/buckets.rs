//! Fixed-interval time buckets anchored to "now".

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::notice::Notice;

/// Per-interval notice counts, most recent slot first.
///
/// A `None` slot lies entirely before the oldest notice in the sample: the
/// sample says nothing about it, which is different from a slot with zero
/// notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSeries {
    pub slots: Vec<Option<usize>>,
    pub slot_count: usize,
    pub interval_seconds: i64,
}

impl BucketSeries {
    /// Slots ordered past to present, for left-to-right rendering
    pub fn chronological(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.slots.iter().rev().copied()
    }

    /// Largest count in the series (0 when every slot is empty)
    pub fn max_count(&self) -> usize {
        self.slots.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Sum of all slot counts
    pub fn total(&self) -> usize {
        self.slots.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Bucket notices into `slot_count` intervals ending now
pub fn bucketize(notices: &[Notice], slot_count: usize, interval_seconds: i64) -> BucketSeries {
    bucketize_at(notices, slot_count, interval_seconds, Utc::now())
}

/// Same as [`bucketize`] with an explicit wall-clock time.
///
/// The anchor is the later of `wall_clock` and the newest notice, so remote
/// timestamps ahead of the local clock still land in slot 0.
pub fn bucketize_at(
    notices: &[Notice],
    slot_count: usize,
    interval_seconds: i64,
    wall_clock: DateTime<Utc>,
) -> BucketSeries {
    let oldest = notices.iter().map(|n| n.created_at).min();
    let now = notices
        .iter()
        .map(|n| n.created_at)
        .max()
        .map_or(wall_clock, |newest| newest.max(wall_clock));
    let interval = Duration::seconds(interval_seconds);

    let slots = (0..slot_count)
        .map(|i| {
            // slots beyond the representable time range predate any notice
            let slot_end = slot_end(now, interval_seconds, i)?;
            let slot_start = slot_end.checked_sub_signed(interval)?;
            match oldest {
                Some(oldest) if oldest <= slot_end => Some(
                    notices
                        .iter()
                        .filter(|n| n.created_at > slot_start && n.created_at <= slot_end)
                        .count(),
                ),
                _ => None,
            }
        })
        .collect();

    BucketSeries {
        slots,
        slot_count,
        interval_seconds,
    }
}

/// End of the `index`-th slot counting back from `now`
fn slot_end(now: DateTime<Utc>, interval_seconds: i64, index: usize) -> Option<DateTime<Utc>> {
    let offset = i64::try_from(index)
        .ok()
        .and_then(|i| interval_seconds.checked_mul(i))
        .and_then(Duration::try_seconds)?;
    now.checked_sub_signed(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn notices_aged(seconds: &[i64]) -> Vec<Notice> {
        seconds
            .iter()
            .enumerate()
            .map(|(i, age)| Notice::new(i.to_string(), now() - Duration::seconds(*age)))
            .collect()
    }

    #[test]
    fn test_single_slot_counts_whole_interval() {
        let notices = notices_aged(&[10, 20, 59, 60, 61]);
        let series = bucketize_at(&notices, 1, 60, now());
        assert_eq!(series.slots.len(), 1);
        // (now - 60, now]: the notice exactly 60s old is excluded
        assert_eq!(series.slots, vec![Some(3)]);
    }

    #[test]
    fn test_slots_are_most_recent_first() {
        let notices = notices_aged(&[30, 90, 100, 150]);
        let series = bucketize_at(&notices, 3, 60, now());
        assert_eq!(series.slots, vec![Some(1), Some(2), Some(1)]);
        assert_eq!(series.slot_count, 3);
        assert_eq!(series.interval_seconds, 60);
    }

    #[test]
    fn test_slots_before_oldest_notice_are_empty() {
        let notices = notices_aged(&[30, 70]);
        let series = bucketize_at(&notices, 5, 60, now());
        assert_eq!(series.slots, vec![Some(1), Some(1), None, None, None]);
    }

    #[test]
    fn test_zero_slot_inside_sample_is_not_empty() {
        let notices = notices_aged(&[30, 150]);
        let series = bucketize_at(&notices, 4, 60, now());
        assert_eq!(series.slots, vec![Some(1), Some(0), Some(1), None]);
    }

    #[test]
    fn test_slots_past_the_calendar_range_are_empty() {
        // about 158,000 years per slot: the third slot ends before year -262143
        let notices = notices_aged(&[0]);
        let series = bucketize_at(&notices, 3, 5_000_000_000_000, now());
        assert_eq!(series.slots, vec![Some(1), None, None]);
    }

    #[test]
    fn test_slot_end_offsets_by_whole_intervals() {
        assert_eq!(slot_end(now(), 60, 0), Some(now()));
        assert_eq!(slot_end(now(), 60, 3), Some(now() - Duration::seconds(180)));
        assert_eq!(slot_end(now(), i64::MAX, 2), None);
    }

    #[test]
    fn test_no_notices_gives_all_empty_slots() {
        let series = bucketize_at(&[], 3, 60, now());
        assert_eq!(series.slots, vec![None, None, None]);
        assert_eq!(series.max_count(), 0);
    }

    #[test]
    fn test_zero_slots() {
        let series = bucketize_at(&notices_aged(&[1]), 0, 60, now());
        assert!(series.is_empty());
    }

    #[test]
    fn test_anchor_follows_notices_ahead_of_clock() {
        // remote clock runs 5 minutes ahead of ours
        let notices = notices_aged(&[-300, -290]);
        let series = bucketize_at(&notices, 2, 60, now());
        assert_eq!(series.slots, vec![Some(2), None]);
    }

    #[test]
    fn test_chronological_reverses_slots() {
        let notices = notices_aged(&[30, 90, 100]);
        let series = bucketize_at(&notices, 3, 60, now());
        let ordered: Vec<Option<usize>> = series.chronological().collect();
        assert_eq!(ordered, vec![None, Some(2), Some(1)]);
        assert_eq!(series.total(), 3);
        assert_eq!(series.max_count(), 2);
    }
}
