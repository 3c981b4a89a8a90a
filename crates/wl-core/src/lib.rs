//! Core domain logic for the work log analyser.
//!
//! This crate contains the fundamental types and logic for:
//! - Line classification: timestamps and rest annotations
//! - Timelines: per-source slot classification on a fixed grid
//! - Merging: combining a local and a remote timeline
//! - Aggregation: work and rest totals, target projection
//! - Day splitting: grouping a multi-day log into logical days

mod aggregate;
mod analysis;
mod classify;
mod day;
pub mod diagnostic;
pub mod grid;
pub mod line;
mod merge;
pub mod state;
pub mod timeline;

pub use aggregate::{DEFAULT_TARGET_HOURS, SlotTotals, TimeInfo, aggregate, hours};
pub use analysis::{Analysis, AnalysisError, DayInput, SourceLines, analyze, analyze_days};
pub use classify::{Classified, ClassifyError, SourceKind, classify};
pub use day::{DEFAULT_DAY_START_HOUR, DayLog, SplitError, split_by_day};
pub use diagnostic::{Diagnostic, MarkerConflict};
pub use grid::{DEFAULT_SLOT_SECONDS, GridError, SlotGrid};
pub use line::{LineError, LineKind, TIMESTAMP_FORMAT, classify_line, leading_timestamp};
pub use merge::{MergeError, Merged, merge, merge_timelines};
pub use state::{SegmentBalance, SegmentId, Slot, SpecialSegment, State};
pub use timeline::{Run, Span, Timeline};
