//! Slot states and special segments.
//!
//! A slot is either a plain [`State`] or a reference into the owning
//! timeline's special segment arena.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::grid::SlotGrid;

/// Plain classification of a slot.
///
/// Variants are declared in lattice order, from the weakest work claim to
/// the strongest, so the derived `Ord` is the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    MayBeRest,
    MayBeWork,
    MustBeRest,
    MustBeWork,
}

impl State {
    #[must_use]
    pub const fn is_work(self) -> bool {
        matches!(self, Self::MayBeWork | Self::MustBeWork)
    }

    #[must_use]
    pub const fn is_rest(self) -> bool {
        matches!(self, Self::MayBeRest | Self::MustBeRest)
    }

    /// Short label used in listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MayBeRest => "R?",
            Self::MayBeWork => "W?",
            Self::MustBeRest => "R",
            Self::MustBeWork => "W",
        }
    }

    /// Combines a local and a remote plain state.
    ///
    /// Returns the merged state and whether the pair is the local-rest vs
    /// remote-work conflict.
    #[must_use]
    pub fn merge(local: Self, remote: Self) -> (Self, bool) {
        match (local, remote) {
            (a, b) if a == b => (a, false),
            (Self::MustBeRest, Self::MustBeWork) => (Self::MustBeWork, true),
            (a, b) => (a.max(b), false),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Index of a special segment inside a timeline's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentId(pub(crate) usize);

impl SegmentId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Content of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    State(State),
    Segment(SegmentId),
}

impl From<State> for Slot {
    fn from(state: State) -> Self {
        Self::State(state)
    }
}

/// A gap annotated with an exact number of rest minutes.
///
/// The gap is split into rest and work slots without saying which slot is
/// which. Merging may take rest slots away one at a time; the work count is
/// fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialSegment {
    start: NaiveDateTime,
    end: NaiveDateTime,
    total_slots: i64,
    rest_slots: i64,
    work_slots: i64,
}

/// How a segment contributes to totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentBalance {
    /// Both sides are non-negative; counted as a whole from the arena.
    Split { rest: i64, work: i64 },
    /// Rest went negative; each referencing slot counts as work.
    AllWork,
    /// Work is negative; each referencing slot counts as rest.
    AllRest,
    /// Nothing left on either side.
    Empty,
}

impl SpecialSegment {
    /// Builds a segment for the gap `start..end` with `rest_minutes` declared.
    #[must_use]
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        rest_minutes: i64,
        grid: &SlotGrid,
    ) -> Self {
        let total_slots = grid.slots_in((end - start).num_seconds());
        let rest_slots = grid.slots_in_minutes(rest_minutes);
        Self {
            start,
            end,
            total_slots,
            rest_slots,
            work_slots: total_slots - rest_slots,
        }
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub const fn total_slots(&self) -> i64 {
        self.total_slots
    }

    #[must_use]
    pub const fn rest_slots(&self) -> i64 {
        self.rest_slots
    }

    #[must_use]
    pub const fn work_slots(&self) -> i64 {
        self.work_slots
    }

    #[must_use]
    pub const fn balance(&self) -> SegmentBalance {
        let (rest, work) = (self.rest_slots, self.work_slots);
        if rest >= 0 && work >= 0 {
            SegmentBalance::Split { rest, work }
        } else if rest <= 0 && work <= 0 {
            SegmentBalance::Empty
        } else if rest < 0 {
            SegmentBalance::AllWork
        } else {
            SegmentBalance::AllRest
        }
    }

    /// One slot of the segment turned out to be work.
    pub(crate) const fn yield_rest_slot(&mut self) {
        self.rest_slots -= 1;
    }

    /// Listing label with both sides in whole minutes.
    #[must_use]
    pub fn label(&self, grid: &SlotGrid) -> String {
        let minutes = |slots: i64| grid.duration_of(slots).num_minutes();
        format!(
            "work: {} rest: {}",
            minutes(self.work_slots),
            minutes(self.rest_slots)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ALL: [State; 4] = [
        State::MayBeRest,
        State::MayBeWork,
        State::MustBeRest,
        State::MustBeWork,
    ];

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn lattice_order() {
        assert!(State::MayBeRest < State::MayBeWork);
        assert!(State::MayBeWork < State::MustBeRest);
        assert!(State::MustBeRest < State::MustBeWork);
    }

    #[test]
    fn merge_is_max_and_commutative_for_plain_states() {
        for a in ALL {
            for b in ALL {
                let (ab, _) = State::merge(a, b);
                let (ba, _) = State::merge(b, a);
                assert_eq!(ab, ba, "{a:?} + {b:?}");
                assert_eq!(ab, a.max(b), "{a:?} + {b:?}");
            }
        }
    }

    #[test]
    fn merge_flags_only_local_rest_against_remote_work() {
        for a in ALL {
            for b in ALL {
                let (_, conflict) = State::merge(a, b);
                let expected = a == State::MustBeRest && b == State::MustBeWork;
                assert_eq!(conflict, expected, "{a:?} + {b:?}");
            }
        }
        assert_eq!(
            State::merge(State::MustBeRest, State::MustBeWork),
            (State::MustBeWork, true)
        );
    }

    #[test]
    fn segment_splits_gap_into_rest_and_work() {
        let grid = SlotGrid::default();
        let seg = SpecialSegment::new(at(9, 0), at(9, 45), 30, &grid);
        assert_eq!(seg.total_slots(), 180);
        assert_eq!(seg.rest_slots(), 120);
        assert_eq!(seg.work_slots(), 60);
        assert_eq!(seg.rest_slots() + seg.work_slots(), seg.total_slots());
        assert_eq!(seg.label(&grid), "work: 15 rest: 30");
    }

    #[test]
    fn yielding_rest_slots_leaves_work_untouched() {
        let grid = SlotGrid::default();
        let mut seg = SpecialSegment::new(at(9, 0), at(9, 45), 30, &grid);
        for _ in 0..7 {
            seg.yield_rest_slot();
        }
        assert_eq!(seg.rest_slots(), 113);
        assert_eq!(seg.work_slots(), 60);
        assert_eq!(seg.total_slots(), 180);
    }

    #[test]
    fn balance_reflects_signs() {
        let grid = SlotGrid::default();
        let mut seg = SpecialSegment::new(at(9, 0), at(9, 10), 1, &grid);
        assert_eq!(seg.balance(), SegmentBalance::Split { rest: 4, work: 36 });
        for _ in 0..5 {
            seg.yield_rest_slot();
        }
        assert_eq!(seg.balance(), SegmentBalance::AllWork);

        let over = SpecialSegment::new(at(9, 0), at(9, 10), 20, &grid);
        assert_eq!(over.balance(), SegmentBalance::AllRest);
    }
}
