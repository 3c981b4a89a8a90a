//! Warnings about ambiguous input.
//!
//! Diagnostics never stop processing. They are collected next to the result
//! and also logged as they are found.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::state::State;

/// Which rest markers contradicted each other inside one gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerConflict {
    /// `rest` together with `rest ???`.
    DefiniteAndUncertain,
    /// `rest N min` together with `rest`.
    MinutesAndDefinite,
    /// `rest N min` together with `rest ???`.
    MinutesAndUncertain,
}

impl MarkerConflict {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::DefiniteAndUncertain => "both 'definitely rest' and 'may be rest' marks",
            Self::MinutesAndDefinite => "both 'definitely rest' and 'rest N min' marks",
            Self::MinutesAndUncertain => "both 'may be rest' and 'rest N min' marks",
        }
    }
}

/// A recoverable problem found while classifying or merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Contradicting rest markers inside a gap of one source.
    MarkerConflict {
        source: String,
        from: NaiveDateTime,
        to: NaiveDateTime,
        conflict: MarkerConflict,
        resolved: State,
    },
    /// The local log says rest where the remote log proves work.
    MergeConflict {
        slot: usize,
        at: NaiveDateTime,
        local: State,
        remote: State,
        resolved: State,
    },
}

impl Diagnostic {
    /// Logs the diagnostic at warn level.
    pub(crate) fn emit(&self) {
        tracing::warn!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerConflict {
                source,
                from,
                to,
                conflict,
                resolved,
            } => write!(
                f,
                "in '{source}' the time segment from {from} to {to} has {}, treating it as {resolved}",
                conflict.describe()
            ),
            Self::MergeConflict {
                slot,
                at,
                local,
                remote,
                resolved,
            } => write!(
                f,
                "merge conflict at slot {slot} ({at}): local is {local} whereas remote is {remote}, using {resolved}"
            ),
        }
    }
}
