//! Timeline classifier.
//!
//! Scans the lines of one log and turns them into a [`Timeline`]. Each
//! timestamp line marks its own slot as certain work; the slots between two
//! timestamp lines form a gap that is resolved as one unit from the rest
//! annotations seen inside it.
//!
//! Nothing after the last timestamp line is filled in: a trailing gap has no
//! closing timestamp to resolve it against.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::diagnostic::{Diagnostic, MarkerConflict};
use crate::grid::SlotGrid;
use crate::line::{LineError, LineKind, classify_line};
use crate::state::{Slot, SpecialSegment, State};
use crate::timeline::{Span, Timeline};

/// Where a log comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The authoritative log; its quantified rest claims become special
    /// segments.
    Local,
    /// A log from another machine; it never claims certain rest.
    Remote,
}

impl SourceKind {
    #[must_use]
    pub const fn is_remote(self) -> bool {
        matches!(self, Self::Remote)
    }
}

/// Errors that stop classification of a source.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{source_name}:{line_no}: {error}")]
    Line {
        source_name: String,
        line_no: usize,
        #[source]
        error: LineError,
    },

    #[error("{source_name}:{line_no}: timestamp {at} is outside the span {first} .. {last}")]
    OutOfSpan {
        source_name: String,
        line_no: usize,
        at: NaiveDateTime,
        first: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("{source_name}:{line_no}: timestamp {at} is earlier than the previous one ({previous})")]
    OutOfOrder {
        source_name: String,
        line_no: usize,
        at: NaiveDateTime,
        previous: NaiveDateTime,
    },
}

/// A classified source.
#[derive(Debug, Clone)]
pub struct Classified {
    pub timeline: Timeline,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rest annotations seen since the last timestamp line.
#[derive(Debug, Clone, Copy, Default)]
struct Gap {
    rest_minutes: bool,
    rest_definite: bool,
    rest_uncertain: bool,
    minutes: i64,
}

/// How a gap resolves before any special segment is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    State(State, Option<MarkerConflict>),
    /// Only `rest N min` lines were seen.
    Minutes(i64),
}

impl Gap {
    fn observe(&mut self, kind: LineKind) {
        match kind {
            LineKind::RestMinutes(n) => {
                self.rest_minutes = true;
                self.minutes = self.minutes.saturating_add(n);
            }
            LineKind::Rest => self.rest_definite = true,
            LineKind::RestUncertain => self.rest_uncertain = true,
            LineKind::Blank | LineKind::Timestamp(_) | LineKind::Other => {}
        }
    }

    const fn resolve(&self) -> Resolution {
        match (self.rest_minutes, self.rest_definite, self.rest_uncertain) {
            (false, false, false) => Resolution::State(State::MayBeWork, None),
            (_, true, true) => Resolution::State(
                State::MustBeRest,
                Some(MarkerConflict::DefiniteAndUncertain),
            ),
            (true, true, false) => Resolution::State(
                State::MustBeRest,
                Some(MarkerConflict::MinutesAndDefinite),
            ),
            (true, false, true) => Resolution::State(
                State::MayBeRest,
                Some(MarkerConflict::MinutesAndUncertain),
            ),
            (false, true, false) => Resolution::State(State::MustBeRest, None),
            (false, false, true) => Resolution::State(State::MayBeRest, None),
            (true, false, false) => Resolution::Minutes(self.minutes),
        }
    }
}

/// The last timestamp line placed on the grid.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    index: usize,
    at: NaiveDateTime,
}

struct Classifier<'a> {
    name: &'a str,
    kind: SourceKind,
    grid: SlotGrid,
    timeline: Timeline,
    diagnostics: Vec<Diagnostic>,
    anchor: Option<Anchor>,
    gap: Gap,
}

impl Classifier<'_> {
    fn stamp(&mut self, line_no: usize, at: NaiveDateTime) -> Result<(), ClassifyError> {
        let span = self.timeline.span();
        let index = match self.timeline.index_of(at) {
            Some(index) if span.contains(at) => index,
            _ => {
                return Err(ClassifyError::OutOfSpan {
                    source_name: self.name.to_string(),
                    line_no,
                    at,
                    first: span.first,
                    last: span.last,
                });
            }
        };
        if let Some(prev) = self.anchor.filter(|prev| prev.at > at) {
            return Err(ClassifyError::OutOfOrder {
                source_name: self.name.to_string(),
                line_no,
                at,
                previous: prev.at,
            });
        }

        self.timeline.set(index, State::MustBeWork.into());
        if let Some(prev) = self.anchor {
            if prev.index + 1 < index {
                let slot = self.resolve_gap(prev.at, at);
                self.timeline.fill(prev.index + 1..index, slot);
            }
        }

        self.anchor = Some(Anchor { index, at });
        self.gap = Gap::default();
        Ok(())
    }

    fn resolve_gap(&mut self, from: NaiveDateTime, to: NaiveDateTime) -> Slot {
        let slot = match self.gap.resolve() {
            Resolution::State(state, conflict) => {
                if let Some(conflict) = conflict {
                    let diagnostic = Diagnostic::MarkerConflict {
                        source: self.name.to_string(),
                        from,
                        to,
                        conflict,
                        resolved: state,
                    };
                    diagnostic.emit();
                    self.diagnostics.push(diagnostic);
                }
                Slot::State(state)
            }
            Resolution::Minutes(_) if self.kind.is_remote() => Slot::State(State::MayBeRest),
            Resolution::Minutes(minutes) => {
                let segment = SpecialSegment::new(from, to, minutes, &self.grid);
                let threshold = self.grid.collapse_threshold();
                if segment.work_slots() <= threshold {
                    Slot::State(State::MayBeRest)
                } else if segment.rest_slots() <= threshold {
                    Slot::State(State::MayBeWork)
                } else {
                    tracing::debug!(
                        source = self.name,
                        %from,
                        %to,
                        minutes,
                        "special segment"
                    );
                    Slot::Segment(self.timeline.push_segment(segment))
                }
            }
        };

        match slot {
            Slot::State(State::MustBeRest) if self.kind.is_remote() => {
                Slot::State(State::MayBeRest)
            }
            slot => slot,
        }
    }
}

/// Classifies the lines of one source on the shared `span`.
///
/// `name` only appears in diagnostics and errors.
pub fn classify<S: AsRef<str>>(
    lines: &[S],
    name: &str,
    kind: SourceKind,
    span: Span,
    grid: SlotGrid,
) -> Result<Classified, ClassifyError> {
    let mut classifier = Classifier {
        name,
        kind,
        grid,
        timeline: Timeline::new(span, grid),
        diagnostics: Vec::new(),
        anchor: None,
        gap: Gap::default(),
    };

    for (line_no, line) in lines.iter().enumerate().map(|(i, l)| (i + 1, l)) {
        let kind = classify_line(line.as_ref()).map_err(|error| ClassifyError::Line {
            source_name: name.to_string(),
            line_no,
            error,
        })?;
        match kind {
            LineKind::Timestamp(at) => classifier.stamp(line_no, at)?,
            other => classifier.gap.observe(other),
        }
    }

    Ok(Classified {
        timeline: classifier.timeline,
        diagnostics: classifier.diagnostics,
    })
}
