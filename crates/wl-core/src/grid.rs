//! Fixed-width time grid.
//!
//! Every timeline is a sequence of equal slots counted from an origin
//! timestamp. The grid knows the slot width and converts between wall-clock
//! timestamps and slot indices.

use chrono::{Duration, NaiveDateTime, Timelike};
use thiserror::Error;

/// Default slot width in seconds.
pub const DEFAULT_SLOT_SECONDS: i64 = 15;

/// Errors from building a grid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The slot width does not split a minute evenly.
    #[error("slot width must be a divisor of 60 seconds, got {seconds}")]
    InvalidStep { seconds: i64 },
}

/// A fixed slot width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    step_seconds: i64,
}

impl SlotGrid {
    /// Creates a grid with the given slot width.
    ///
    /// The width has to divide a minute so that rounding to the grid is
    /// stable across minute boundaries.
    pub const fn new(step_seconds: i64) -> Result<Self, GridError> {
        if step_seconds <= 0 || 60 % step_seconds != 0 {
            return Err(GridError::InvalidStep {
                seconds: step_seconds,
            });
        }
        Ok(Self { step_seconds })
    }

    #[must_use]
    pub const fn step_seconds(&self) -> i64 {
        self.step_seconds
    }

    #[must_use]
    pub fn step(&self) -> Duration {
        Duration::seconds(self.step_seconds)
    }

    /// Slot index of `t` on a grid starting at `origin`.
    ///
    /// The caller guarantees `t >= origin`; earlier timestamps map to slot 0.
    #[must_use]
    pub fn slot_index(&self, t: NaiveDateTime, origin: NaiveDateTime) -> usize {
        debug_assert!(t >= origin, "{t} is before grid origin {origin}");
        usize::try_from(self.slots_in((t - origin).num_seconds())).unwrap_or(0)
    }

    /// Wall-clock start of slot `index` on a grid starting at `origin`.
    #[must_use]
    pub fn time_for_slot(&self, index: usize, origin: NaiveDateTime) -> NaiveDateTime {
        let index = i64::try_from(index).unwrap_or(i64::MAX / self.step_seconds);
        origin + Duration::seconds(index * self.step_seconds)
    }

    /// Moves a slot index from one origin to another.
    #[must_use]
    pub fn reindex(&self, index: usize, from: NaiveDateTime, to: NaiveDateTime) -> usize {
        self.slot_index(self.time_for_slot(index, from), to)
    }

    /// Whole slots in a number of seconds.
    #[must_use]
    pub const fn slots_in(&self, seconds: i64) -> i64 {
        seconds.div_euclid(self.step_seconds)
    }

    /// Whole slots in a number of minutes.
    #[must_use]
    pub const fn slots_in_minutes(&self, minutes: i64) -> i64 {
        self.slots_in(minutes.saturating_mul(60))
    }

    /// Duration covered by `slots` slots.
    #[must_use]
    pub fn duration_of(&self, slots: i64) -> Duration {
        Duration::seconds(slots.saturating_mul(self.step_seconds))
    }

    /// Largest slot count a special segment side may have and still be
    /// considered negligible: one slot more than a minute.
    #[must_use]
    pub const fn collapse_threshold(&self) -> i64 {
        1 + (60 + self.step_seconds - 1) / self.step_seconds
    }

    /// Rounds `t` down to a slot boundary.
    #[must_use]
    pub fn floor(&self, t: NaiveDateTime) -> NaiveDateTime {
        let t = t.with_nanosecond(0).unwrap_or(t);
        t - Duration::seconds(self.offset(t))
    }

    /// Rounds `t` up to a slot boundary.
    #[must_use]
    pub fn ceil(&self, t: NaiveDateTime) -> NaiveDateTime {
        let t = t.with_nanosecond(0).unwrap_or(t);
        match self.offset(t) {
            0 => t,
            rem => t + Duration::seconds(self.step_seconds - rem),
        }
    }

    fn offset(&self, t: NaiveDateTime) -> i64 {
        i64::from(t.num_seconds_from_midnight()) % self.step_seconds
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            step_seconds: DEFAULT_SLOT_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn rejects_widths_that_do_not_divide_a_minute() {
        assert!(SlotGrid::new(0).is_err());
        assert!(SlotGrid::new(-15).is_err());
        assert!(SlotGrid::new(7).is_err());
        assert!(SlotGrid::new(15).is_ok());
        assert!(SlotGrid::new(60).is_ok());
    }

    #[test]
    fn slot_index_floors_partial_slots() {
        let grid = SlotGrid::default();
        let origin = at(9, 0, 0);
        assert_eq!(grid.slot_index(origin, origin), 0);
        assert_eq!(grid.slot_index(at(9, 0, 14), origin), 0);
        assert_eq!(grid.slot_index(at(9, 0, 15), origin), 1);
        assert_eq!(grid.slot_index(at(9, 45, 0), origin), 180);
    }

    #[test]
    fn time_for_slot_is_inverse_on_boundaries() {
        let grid = SlotGrid::default();
        let origin = at(9, 0, 0);
        assert_eq!(grid.time_for_slot(180, origin), at(9, 45, 0));
        assert_eq!(grid.slot_index(grid.time_for_slot(42, origin), origin), 42);
    }

    #[test]
    fn reindex_shifts_between_origins() {
        let grid = SlotGrid::default();
        let early = at(8, 0, 0);
        let late = at(9, 0, 0);
        // 9:01 is slot 4 from 9:00 and slot 244 from 8:00
        assert_eq!(grid.reindex(4, late, early), 244);
        assert_eq!(grid.reindex(244, early, late), 4);
    }

    #[test]
    fn floor_and_ceil_round_to_slot_boundaries() {
        let grid = SlotGrid::default();
        assert_eq!(grid.floor(at(9, 0, 7)), at(9, 0, 0));
        assert_eq!(grid.ceil(at(9, 0, 7)), at(9, 0, 15));
        assert_eq!(grid.ceil(at(9, 0, 50)), at(9, 1, 0));
        assert_eq!(grid.floor(at(9, 0, 30)), at(9, 0, 30));
        assert_eq!(grid.ceil(at(9, 0, 30)), at(9, 0, 30));
    }

    #[test]
    fn collapse_threshold_is_one_more_than_a_minute() {
        assert_eq!(SlotGrid::default().collapse_threshold(), 5);
        assert_eq!(SlotGrid::new(60).unwrap().collapse_threshold(), 2);
        assert_eq!(SlotGrid::new(1).unwrap().collapse_threshold(), 61);
    }

    #[test]
    fn minutes_convert_to_slots() {
        let grid = SlotGrid::default();
        assert_eq!(grid.slots_in_minutes(30), 120);
        assert_eq!(grid.duration_of(120), Duration::minutes(30));
    }
}
