//! Slot timelines.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::grid::SlotGrid;
use crate::line::{LineError, leading_timestamp};
use crate::state::{SegmentId, Slot, SpecialSegment};

/// First and last timestamp covered by a timeline, aligned to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
}

impl Span {
    /// Finds the span of the timestamp lines in `lines`.
    ///
    /// The earliest timestamp is rounded down and the latest one up to slot
    /// boundaries, wherever they appear in `lines`. Returns `None` when no
    /// line carries a timestamp.
    pub fn of_lines<S: AsRef<str>>(lines: &[S], grid: &SlotGrid) -> Result<Option<Self>, LineError> {
        let mut bounds: Option<(NaiveDateTime, NaiveDateTime)> = None;
        for line in lines {
            if let Some(ts) = leading_timestamp(line.as_ref())? {
                bounds = Some(bounds.map_or((ts, ts), |(first, last)| {
                    (first.min(ts), last.max(ts))
                }));
            }
        }
        Ok(bounds.map(|(first, last)| Self {
            first: grid.floor(first),
            last: grid.ceil(last),
        }))
    }

    /// Smallest span covering both inputs.
    #[must_use]
    pub fn union(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Self {
                first: a.first.min(b.first),
                last: a.last.max(b.last),
            }),
            (a, b) => a.or(b),
        }
    }

    /// Number of slots needed to cover the span, both ends included.
    #[must_use]
    pub fn slot_count(&self, grid: &SlotGrid) -> usize {
        1 + grid.slot_index(self.last, self.first)
    }

    #[must_use]
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.first <= t && t <= self.last
    }
}

/// Classified slots for one source (or for a merge of two sources).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    span: Span,
    grid: SlotGrid,
    slots: Vec<Option<Slot>>,
    segments: Vec<SpecialSegment>,
}

/// A maximal stretch of equal consecutive slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    /// Exclusive end index.
    pub end: usize,
    pub slot: Option<Slot>,
}

impl Run {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Timeline {
    /// Creates a timeline with every slot unset.
    #[must_use]
    pub fn new(span: Span, grid: SlotGrid) -> Self {
        if span.last - span.first >= Duration::days(1) {
            tracing::warn!(
                first = %span.first,
                last = %span.last,
                "timeline spans more than one day"
            );
        }
        Self {
            span,
            grid,
            slots: vec![None; span.slot_count(&grid)],
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub const fn first_time(&self) -> NaiveDateTime {
        self.span.first
    }

    #[must_use]
    pub const fn last_time(&self) -> NaiveDateTime {
        self.span.last
    }

    #[must_use]
    pub const fn grid(&self) -> SlotGrid {
        self.grid
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<Slot>] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.slots.get(index).copied().flatten()
    }

    #[must_use]
    pub fn segments(&self) -> &[SpecialSegment] {
        &self.segments
    }

    #[must_use]
    pub fn segment(&self, id: SegmentId) -> &SpecialSegment {
        &self.segments[id.0]
    }

    /// Wall-clock start of slot `index`.
    #[must_use]
    pub fn time_for_slot(&self, index: usize) -> NaiveDateTime {
        self.grid.time_for_slot(index, self.span.first)
    }

    /// Slot holding `t`, if `t` lies inside the timeline.
    #[must_use]
    pub fn index_of(&self, t: NaiveDateTime) -> Option<usize> {
        if t < self.span.first {
            return None;
        }
        let index = self.grid.slot_index(t, self.span.first);
        (index < self.slots.len()).then_some(index)
    }

    /// Number of slots that were never assigned.
    #[must_use]
    pub fn unset_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Groups consecutive equal slots.
    #[must_use]
    pub fn runs(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.slot == *slot => run.end = index + 1,
                _ => runs.push(Run {
                    start: index,
                    end: index + 1,
                    slot: *slot,
                }),
            }
        }
        runs
    }

    pub(crate) fn set(&mut self, index: usize, slot: Slot) {
        self.slots[index] = Some(slot);
    }

    pub(crate) fn fill(&mut self, range: std::ops::Range<usize>, slot: Slot) {
        for cell in &mut self.slots[range] {
            *cell = Some(slot);
        }
    }

    pub(crate) fn push_segment(&mut self, segment: SpecialSegment) -> SegmentId {
        self.segments.push(segment);
        SegmentId(self.segments.len() - 1)
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut SpecialSegment {
        &mut self.segments[id.0]
    }

    /// An empty timeline on the same span and grid that shares this
    /// timeline's segment arena.
    pub(crate) fn blank_with_segments(&self) -> Self {
        Self {
            span: self.span,
            grid: self.grid,
            slots: vec![None; self.slots.len()],
            segments: self.segments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn span_rounds_outward() {
        let grid = SlotGrid::default();
        let lines = [
            "notes before the first stamp",
            "2024-01-01_09-00-07 start",
            "rest",
            "2024-01-01_10-00-03 end",
            "trailing",
        ];
        let span = Span::of_lines(&lines, &grid).unwrap().unwrap();
        assert_eq!(span.first, at(9, 0, 0));
        assert_eq!(span.last, at(10, 0, 15));
        assert_eq!(span.slot_count(&grid), 242);
    }

    #[test]
    fn span_takes_earliest_and_latest_stamp() {
        let grid = SlotGrid::default();
        let lines = [
            "2024-01-01_09-00-00",
            "2024-01-01_10-00-00",
            "2024-01-01_09-30-00",
        ];
        let span = Span::of_lines(&lines, &grid).unwrap().unwrap();
        assert_eq!(span.first, at(9, 0, 0));
        assert_eq!(span.last, at(10, 0, 0));
    }

    #[test]
    fn span_of_lines_without_timestamps_is_none() {
        let grid = SlotGrid::default();
        let lines: [&str; 2] = ["rest", "work"];
        assert_eq!(Span::of_lines(&lines, &grid).unwrap(), None);
        let empty: [&str; 0] = [];
        assert_eq!(Span::of_lines(&empty, &grid).unwrap(), None);
    }

    #[test]
    fn span_union_takes_min_and_max() {
        let a = Span {
            first: at(9, 0, 0),
            last: at(10, 0, 0),
        };
        let b = Span {
            first: at(8, 30, 0),
            last: at(9, 30, 0),
        };
        let u = Span::union(Some(a), Some(b)).unwrap();
        assert_eq!(u.first, at(8, 30, 0));
        assert_eq!(u.last, at(10, 0, 0));
        assert_eq!(Span::union(Some(a), None), Some(a));
        assert_eq!(Span::union(None, Some(b)), Some(b));
        assert_eq!(Span::union(None, None), None);
    }

    #[test]
    fn new_timeline_is_unset() {
        let grid = SlotGrid::default();
        let span = Span {
            first: at(9, 0, 0),
            last: at(9, 1, 0),
        };
        let timeline = Timeline::new(span, grid);
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline.unset_count(), 5);
        assert_eq!(timeline.time_for_slot(4), at(9, 1, 0));
        assert_eq!(timeline.index_of(at(9, 0, 59)), Some(3));
        assert_eq!(timeline.index_of(at(8, 59, 59)), None);
        assert_eq!(timeline.index_of(at(9, 2, 0)), None);
    }

    #[test]
    fn runs_group_equal_neighbours() {
        let grid = SlotGrid::default();
        let span = Span {
            first: at(9, 0, 0),
            last: at(9, 1, 0),
        };
        let mut timeline = Timeline::new(span, grid);
        timeline.set(0, State::MustBeWork.into());
        timeline.fill(1..3, State::MayBeRest.into());
        timeline.set(3, State::MustBeWork.into());

        let runs = timeline.runs();
        let shape: Vec<_> = runs.iter().map(|r| (r.start, r.len(), r.slot)).collect();
        assert_eq!(
            shape,
            vec![
                (0, 1, Some(Slot::State(State::MustBeWork))),
                (1, 2, Some(Slot::State(State::MayBeRest))),
                (3, 1, Some(Slot::State(State::MustBeWork))),
                (4, 1, None),
            ]
        );
    }
}
