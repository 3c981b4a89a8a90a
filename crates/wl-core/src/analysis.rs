//! One-shot analysis of a local and an optional remote log.
//!
//! Both sources are classified on a common span, merged and counted. Days
//! are independent of each other and are analysed in parallel.

use rayon::prelude::*;
use thiserror::Error;

use crate::aggregate::{SlotTotals, aggregate};
use crate::classify::{ClassifyError, SourceKind, classify};
use crate::diagnostic::Diagnostic;
use crate::grid::SlotGrid;
use crate::line::LineError;
use crate::merge::{MergeError, merge};
use crate::timeline::{Span, Timeline};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{source_name}: {error}")]
    Span {
        source_name: String,
        #[source]
        error: LineError,
    },

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// The named lines of one source.
#[derive(Debug)]
pub struct SourceLines<'a, S> {
    pub name: &'a str,
    pub lines: &'a [S],
}

impl<S> Clone for SourceLines<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SourceLines<'_, S> {}

impl<'a, S> SourceLines<'a, S> {
    pub const fn new(name: &'a str, lines: &'a [S]) -> Self {
        Self { name, lines }
    }
}

/// Sources of one day.
#[derive(Debug)]
pub struct DayInput<'a, S> {
    pub local: Option<SourceLines<'a, S>>,
    pub remote: Option<SourceLines<'a, S>>,
}

/// Everything computed for one day.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub span: Span,
    pub local: Option<Timeline>,
    pub remote: Option<Timeline>,
    pub merged: Timeline,
    pub totals: SlotTotals,
    pub diagnostics: Vec<Diagnostic>,
}

/// Classifies, merges and counts one day.
///
/// A source without any timestamp line counts as absent. Returns `None` when
/// both sources are absent.
pub fn analyze<S: AsRef<str>>(
    local: Option<SourceLines<'_, S>>,
    remote: Option<SourceLines<'_, S>>,
    grid: SlotGrid,
) -> Result<Option<Analysis>, AnalysisError> {
    let local_span = source_span(local, &grid)?;
    let remote_span = source_span(remote, &grid)?;
    let Some(span) = Span::union(local_span, remote_span) else {
        return Ok(None);
    };
    tracing::debug!(first = %span.first, last = %span.last, "analysing span");

    let mut diagnostics = Vec::new();
    let local_timeline = classify_source(
        local.filter(|_| local_span.is_some()),
        SourceKind::Local,
        span,
        grid,
        &mut diagnostics,
    )?;
    let remote_timeline = classify_source(
        remote.filter(|_| remote_span.is_some()),
        SourceKind::Remote,
        span,
        grid,
        &mut diagnostics,
    )?;

    let Some(merged) = merge(local_timeline.clone(), remote_timeline.clone())? else {
        return Ok(None);
    };
    diagnostics.extend(merged.diagnostics);
    let totals = aggregate(&merged.timeline);

    Ok(Some(Analysis {
        span,
        local: local_timeline,
        remote: remote_timeline,
        merged: merged.timeline,
        totals,
        diagnostics,
    }))
}

/// Runs [`analyze`] over independent days in parallel, keeping their order.
pub fn analyze_days<S: AsRef<str> + Sync>(
    days: &[DayInput<'_, S>],
    grid: SlotGrid,
) -> Result<Vec<Option<Analysis>>, AnalysisError> {
    days.par_iter()
        .map(|day| analyze(day.local, day.remote, grid))
        .collect()
}

fn classify_source<S: AsRef<str>>(
    source: Option<SourceLines<'_, S>>,
    kind: SourceKind,
    span: Span,
    grid: SlotGrid,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<Timeline>, AnalysisError> {
    let Some(source) = source else {
        return Ok(None);
    };
    let classified = classify(source.lines, source.name, kind, span, grid)?;
    diagnostics.extend(classified.diagnostics);
    Ok(Some(classified.timeline))
}

fn source_span<S: AsRef<str>>(
    source: Option<SourceLines<'_, S>>,
    grid: &SlotGrid,
) -> Result<Option<Span>, AnalysisError> {
    let Some(source) = source else {
        return Ok(None);
    };
    Span::of_lines(source.lines, grid).map_err(|error| AnalysisError::Span {
        source_name: source.name.to_string(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Slot, State};

    const LOCAL: [&str; 5] = [
        "2024-01-01_09-00-00",
        "rest 30 min",
        "2024-01-01_09-45-00",
        "rest",
        "2024-01-01_10-00-00",
    ];

    const REMOTE: [&str; 3] = ["2024-01-01_08-50-00", "work", "2024-01-01_09-10-00"];

    #[test]
    fn local_only_day() {
        let analysis = analyze(
            Some(SourceLines::new("local", &LOCAL[..])),
            None,
            SlotGrid::default(),
        )
        .unwrap()
        .unwrap();
        assert!(analysis.remote.is_none());
        assert_eq!(Some(&analysis.merged), analysis.local.as_ref());
        assert_eq!(analysis.totals.rest, 120 + 59);
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn remote_extends_the_common_span() {
        let analysis = analyze(
            Some(SourceLines::new("local", &LOCAL[..])),
            Some(SourceLines::new("remote", &REMOTE[..])),
            SlotGrid::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(analysis.span.first.format("%H:%M").to_string(), "08:50");
        assert_eq!(analysis.merged.len(), 281);
        // remote work before the local log starts
        assert_eq!(
            analysis.merged.slot(1),
            Some(Slot::State(State::MayBeWork))
        );
        // remote work 9:00 .. 9:10 eats 40 rest slots of the segment
        assert_eq!(analysis.merged.segments()[0].rest_slots(), 80);
        assert_eq!(analysis.local.unwrap().segments()[0].rest_slots(), 120);
    }

    #[test]
    fn sources_without_timestamps_are_absent() {
        let notes = ["rest", "work"];
        let none = analyze(
            Some(SourceLines::new("local", &notes[..])),
            Some(SourceLines::new("remote", &notes[..])),
            SlotGrid::default(),
        )
        .unwrap();
        assert!(none.is_none());

        let remote_only = analyze(
            Some(SourceLines::new("local", &notes[..])),
            Some(SourceLines::new("remote", &REMOTE[..])),
            SlotGrid::default(),
        )
        .unwrap()
        .unwrap();
        assert!(remote_only.local.is_none());
        assert_eq!(remote_only.totals.work, 81);
    }

    #[test]
    fn conflicts_from_both_stages_are_collected() {
        let local = [
            "2024-01-01_09-00-00",
            "rest",
            "rest ?",
            "2024-01-01_09-10-00",
        ];
        let remote = ["2024-01-01_09-05-00"];
        let analysis = analyze(
            Some(SourceLines::new("local", &local[..])),
            Some(SourceLines::new("remote", &remote[..])),
            SlotGrid::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(analysis.diagnostics.len(), 2);
        assert!(matches!(analysis.diagnostics[0], Diagnostic::MarkerConflict { .. }));
        assert!(matches!(analysis.diagnostics[1], Diagnostic::MergeConflict { slot: 20, .. }));
    }

    #[test]
    fn malformed_remote_fails_the_day() {
        let remote = ["2024-01-01_09-99-00"];
        let err = analyze(
            Some(SourceLines::new("local", &LOCAL[..])),
            Some(SourceLines::new("remote", &remote[..])),
            SlotGrid::default(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("remote: malformed timestamp"));
    }

    #[test]
    fn backwards_stamp_is_reported_on_its_own_line() {
        let backwards = ["2024-01-01_10-00-00", "2024-01-01_09-00-00"];
        let err = analyze(
            Some(SourceLines::new("local", &backwards[..])),
            None,
            SlotGrid::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Classify(ClassifyError::OutOfOrder { line_no: 2, .. })
        ));

        let late = ["2024-01-01_09-00-00", "2024-01-01_10-00-00", "2024-01-01_09-30-00"];
        let err = analyze(
            Some(SourceLines::new("local", &late[..])),
            None,
            SlotGrid::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Classify(ClassifyError::OutOfOrder { line_no: 3, .. })
        ));
    }

    #[test]
    fn days_keep_their_order() {
        let second = ["2024-01-02_09-00-00", "2024-01-02_09-01-00"];
        let days = [
            DayInput {
                local: Some(SourceLines::new("2024-01-01", &LOCAL[..])),
                remote: None,
            },
            DayInput {
                local: None,
                remote: None,
            },
            DayInput {
                local: Some(SourceLines::new("2024-01-02", &second[..])),
                remote: None,
            },
        ];
        let results = analyze_days(&days, SlotGrid::default()).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().merged.len(), 241);
        assert!(results[1].is_none());
        assert_eq!(results[2].as_ref().unwrap().totals.work, 5);
    }
}
