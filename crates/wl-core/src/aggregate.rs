//! Work and rest totals.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::grid::SlotGrid;
use crate::state::{SegmentBalance, Slot};
use crate::timeline::Timeline;

/// Default daily work target in hours.
pub const DEFAULT_TARGET_HOURS: f64 = 5.5;

/// Slot counts of a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlotTotals {
    /// Rest slots counted from plain states.
    pub rest_from_list: i64,
    /// Work slots counted from plain states.
    pub work_from_list: i64,
    /// All rest slots, special segments included.
    pub rest: i64,
    /// All work slots, special segments included.
    pub work: i64,
}

impl SlotTotals {
    /// Share of rest among all counted slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rest_ratio(&self) -> Option<f64> {
        let all = self.rest + self.work;
        (all > 0).then(|| self.rest as f64 / all as f64)
    }
}

/// Counts work and rest slots of a timeline.
///
/// Plain states count one slot each. Slots that reference a special segment
/// are skipped while the segment still has both sides; the segment's own
/// counts are added once instead. A segment whose rest went negative counts
/// each of its slots as work (and one whose work is negative, as rest).
#[must_use]
pub fn aggregate(timeline: &Timeline) -> SlotTotals {
    let mut totals = SlotTotals::default();

    for slot in timeline.slots().iter().flatten() {
        match *slot {
            Slot::State(state) if state.is_work() => totals.work_from_list += 1,
            Slot::State(_) => totals.rest_from_list += 1,
            Slot::Segment(id) => match timeline.segment(id).balance() {
                SegmentBalance::AllWork => totals.work_from_list += 1,
                SegmentBalance::AllRest => totals.rest_from_list += 1,
                SegmentBalance::Split { .. } | SegmentBalance::Empty => {}
            },
        }
    }

    totals.rest = totals.rest_from_list;
    totals.work = totals.work_from_list;
    for segment in timeline.segments() {
        if let SegmentBalance::Split { rest, work } = segment.balance() {
            totals.rest += rest;
            totals.work += work;
        }
    }
    totals
}

/// Durations derived from slot totals and a work target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInfo {
    pub totals: SlotTotals,
    pub rest_from_list: Duration,
    pub work_from_list: Duration,
    pub rest: Duration,
    pub work: Duration,
    pub target_hours: f64,
    /// Work still needed to reach the target; negative once it is exceeded.
    pub to_target: Duration,
}

impl TimeInfo {
    #[must_use]
    pub fn new(totals: SlotTotals, target_hours: f64, grid: &SlotGrid) -> Self {
        let work = grid.duration_of(totals.work);
        Self {
            totals,
            rest_from_list: grid.duration_of(totals.rest_from_list),
            work_from_list: grid.duration_of(totals.work_from_list),
            rest: grid.duration_of(totals.rest),
            work,
            target_hours,
            to_target: hours(target_hours) - work,
        }
    }

    /// Wall-clock time at which the target is reached if work starts at `now`.
    #[must_use]
    pub fn ideal_finish(&self, now: NaiveDateTime) -> NaiveDateTime {
        now + self.to_target
    }
}

/// Converts fractional hours to a duration, rounded to the second.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hours(value: f64) -> Duration {
    Duration::seconds((value * 3600.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{SourceKind, classify};
    use crate::merge::merge_timelines;
    use crate::timeline::Span;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn span() -> Span {
        Span {
            first: at(9, 0),
            last: at(10, 0),
        }
    }

    fn timeline(lines: &[&str], kind: SourceKind) -> Timeline {
        classify(lines, "test", kind, span(), SlotGrid::default())
            .unwrap()
            .timeline
    }

    #[test]
    fn plain_states_count_per_slot() {
        let t = timeline(
            &[
                "2024-01-01_09-00-00",
                "rest",
                "2024-01-01_09-30-00",
                "2024-01-01_10-00-00",
            ],
            SourceKind::Local,
        );
        let totals = aggregate(&t);
        // 119 rest slots between 9:00 and 9:30, the rest is work
        assert_eq!(totals.rest_from_list, 119);
        assert_eq!(totals.work_from_list, 241 - 119);
        assert_eq!(totals.rest, 119);
        assert_eq!(totals.work, 122);
        assert_eq!(totals.rest + totals.work, i64::try_from(t.len()).unwrap());
    }

    #[test]
    fn segments_are_counted_once_from_the_arena() {
        let t = timeline(
            &[
                "2024-01-01_09-00-00",
                "rest 30 min",
                "2024-01-01_09-45-00",
                "2024-01-01_10-00-00",
            ],
            SourceKind::Local,
        );
        let totals = aggregate(&t);
        // stamps at 0 and 180, may-be-work 181..240, stamp at 240
        assert_eq!(totals.work_from_list, 2 + 59 + 1);
        assert_eq!(totals.rest_from_list, 0);
        assert_eq!(totals.rest, 120);
        assert_eq!(totals.work, 62 + 60);
    }

    #[test]
    fn merged_totals_include_segment_duration() {
        let local = timeline(
            &[
                "2024-01-01_09-00-00",
                "rest 30 min",
                "2024-01-01_09-45-00",
                "rest",
                "2024-01-01_10-00-00",
            ],
            SourceKind::Local,
        );
        let remote = timeline(
            &["2024-01-01_09-10-00", "rest ?", "2024-01-01_09-20-00"],
            SourceKind::Remote,
        );
        let merged = merge_timelines(&local, &remote).unwrap().timeline;
        let totals = aggregate(&merged);

        assert!(totals.rest >= 0 && totals.work >= 0);
        let set = i64::try_from(merged.len() - merged.unset_count()).unwrap();
        // the segment's duration also covers its opening timestamp slot
        assert_eq!(totals.rest + totals.work, set + 1);
        assert_eq!(totals.work_from_list, 5);
        assert_eq!(totals.rest_from_list, 59);
        assert_eq!(merged.segments()[0].rest_slots(), 118);
    }

    #[test]
    fn exhausted_segment_counts_its_slots_as_work() {
        // 10 min gap, 2 min rest: 8 rest slots, 32 work slots
        let local = timeline(
            &["2024-01-01_09-00-00", "rest 2 min", "2024-01-01_09-10-00"],
            SourceKind::Local,
        );
        // remote work over the first 9 gap slots takes 9 rest slots
        let remote = timeline(
            &["2024-01-01_09-00-15", "2024-01-01_09-02-15"],
            SourceKind::Remote,
        );
        let merged = merge_timelines(&local, &remote).unwrap().timeline;
        assert_eq!(merged.segments()[0].rest_slots(), -1);

        let totals = aggregate(&merged);
        // 2 stamps + 9 remote work slots + 30 remaining segment slots
        assert_eq!(totals.work_from_list, 41);
        assert_eq!(totals.rest_from_list, 0);
        assert_eq!(totals.work, 41);
        assert_eq!(totals.rest, 0);
    }

    #[test]
    fn time_info_projects_the_target() {
        let totals = SlotTotals {
            rest_from_list: 240,
            work_from_list: 480,
            rest: 240,
            work: 960,
        };
        let info = TimeInfo::new(totals, DEFAULT_TARGET_HOURS, &SlotGrid::default());
        assert_eq!(info.work, Duration::hours(4));
        assert_eq!(info.rest, Duration::hours(1));
        assert_eq!(info.to_target, Duration::minutes(90));
        assert_eq!(info.ideal_finish(at(13, 0)), at(14, 30));
        assert_eq!(totals.rest_ratio(), Some(0.2));
    }

    #[test]
    fn exceeded_target_is_negative() {
        let totals = SlotTotals {
            work: 1440,
            ..SlotTotals::default()
        };
        let info = TimeInfo::new(totals, 5.5, &SlotGrid::default());
        assert_eq!(info.to_target, -Duration::minutes(30));
        assert_eq!(SlotTotals::default().rest_ratio(), None);
    }
}
