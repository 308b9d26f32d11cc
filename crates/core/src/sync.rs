//! Playback position to caption lookup.

use crate::srt::CaptionEntry;
use crate::timeline::Timeline;
use tracing::trace;

/// Index of the first caption whose window contains `position`.
/// Overlapping captions resolve to the earliest one.
pub fn find_active(entries: &[CaptionEntry], position: f64) -> Option<usize> {
    entries.iter().position(|entry| entry.contains(position))
}

/// Index of the caption whose start is closest to `position`.
/// Ties go to the earliest caption and NaN starts are never picked.
pub fn find_nearest(entries: &[CaptionEntry], position: f64) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.start.is_nan())
        .map(|(i, entry)| (i, (entry.start - position).abs()))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

/// Periodic time to caption lookup over a timeline.
#[derive(Debug, Default)]
pub struct SyncEngine {
    ticks: u64,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the caption active at `position` and record it on the timeline.
    pub fn tick(&mut self, timeline: &mut Timeline, position: f64) -> Option<usize> {
        self.ticks += 1;
        let active = find_active(timeline.current(), position);
        if active != timeline.active() {
            trace!(position, ?active, "sync: active caption changed");
        }
        timeline.set_active(active);
        active
    }

    /// How many lookups have run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline() -> Timeline {
        let mut timeline = Timeline::new();
        timeline.load(vec![
            CaptionEntry::new(1.0, 2.0, "Hello"),
            CaptionEntry::new(3.0, 4.0, "World"),
        ]);
        timeline
    }

    /// Ensure positions inside, between and after captions resolve as expected.
    #[test]
    fn selects_caption_by_position() {
        let mut timeline = timeline();
        let mut engine = SyncEngine::new();
        assert_eq!(engine.tick(&mut timeline, 1.5), Some(0));
        assert_eq!(timeline.active(), Some(0));
        assert_eq!(engine.tick(&mut timeline, 2.5), None);
        assert_eq!(timeline.active(), None);
        assert_eq!(engine.tick(&mut timeline, 3.5), Some(1));
        assert_eq!(engine.tick(&mut timeline, 9.0), None);
        assert_eq!(engine.ticks(), 4);
    }

    /// Ensure both window bounds are inclusive.
    #[test]
    fn bounds_are_inclusive() {
        let timeline = timeline();
        assert_eq!(find_active(timeline.current(), 1.0), Some(0));
        assert_eq!(find_active(timeline.current(), 2.0), Some(0));
        assert_eq!(find_active(timeline.current(), 4.0), Some(1));
    }

    /// Ensure overlapping captions resolve to the earliest one.
    #[test]
    fn first_match_wins() {
        let entries = vec![
            CaptionEntry::new(1.0, 5.0, "long"),
            CaptionEntry::new(2.0, 3.0, "short"),
        ];
        assert_eq!(find_active(&entries, 2.5), Some(0));
    }

    /// Ensure NaN windows never match and never win the nearest search.
    #[test]
    fn nan_entries_are_ignored() {
        let entries = vec![
            CaptionEntry::new(f64::NAN, f64::NAN, "broken"),
            CaptionEntry::new(3.0, 4.0, "fine"),
        ];
        assert_eq!(find_active(&entries, 3.5), Some(1));
        assert_eq!(find_nearest(&entries, 0.0), Some(1));
    }

    /// Ensure the nearest search measures distance to the start.
    #[test]
    fn nearest_by_start() {
        let entries = vec![
            CaptionEntry::new(1.0, 2.9, "a"),
            CaptionEntry::new(3.0, 4.0, "b"),
        ];
        assert_eq!(find_nearest(&entries, 2.8), Some(1));
        assert_eq!(find_nearest(&entries, 2.0), Some(0));
        assert_eq!(find_nearest(&[], 2.0), None);
    }
}
