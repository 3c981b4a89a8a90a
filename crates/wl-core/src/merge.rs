//! Merging a local and a remote timeline.
//!
//! The local log is authoritative for quantified rest; the remote log can
//! only add evidence of work. Plain states merge by the lattice maximum.
//! Special segments survive uncertain remote rest, and give up one rest slot
//! for every slot the remote log shows as work.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::state::{Slot, State};
use crate::timeline::Timeline;

/// Inputs that break the merge contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error(
        "timelines are not aligned: local {local_first} .. {local_last} ({local_len} slots), \
         remote {remote_first} .. {remote_last} ({remote_len} slots)"
    )]
    Misaligned {
        local_first: NaiveDateTime,
        local_last: NaiveDateTime,
        local_len: usize,
        remote_first: NaiveDateTime,
        remote_last: NaiveDateTime,
        remote_len: usize,
    },

    #[error("timelines use different slot widths ({local}s and {remote}s)")]
    GridMismatch { local: i64, remote: i64 },

    #[error("remote slot {slot} claims certain rest")]
    RemoteMustBeRest { slot: usize },

    #[error("remote slot {slot} references a special segment")]
    RemoteSegment { slot: usize },
}

/// A merged timeline and the conflicts found on the way.
#[derive(Debug, Clone)]
pub struct Merged {
    pub timeline: Timeline,
    pub diagnostics: Vec<Diagnostic>,
}

/// Merges two optional timelines.
///
/// A missing side leaves the other one untouched; two missing sides give
/// `None`.
pub fn merge(
    local: Option<Timeline>,
    remote: Option<Timeline>,
) -> Result<Option<Merged>, MergeError> {
    match (local, remote) {
        (Some(local), Some(remote)) => merge_timelines(&local, &remote).map(Some),
        (Some(timeline), None) | (None, Some(timeline)) => Ok(Some(Merged {
            timeline,
            diagnostics: Vec::new(),
        })),
        (None, None) => Ok(None),
    }
}

/// Merges two aligned timelines slot by slot.
///
/// The result carries its own copy of the local segment arena; segment
/// decrements apply to that copy only.
pub fn merge_timelines(local: &Timeline, remote: &Timeline) -> Result<Merged, MergeError> {
    check_aligned(local, remote)?;

    let mut merged = local.blank_with_segments();
    let mut diagnostics = Vec::new();

    for (index, (&a, &b)) in local.slots().iter().zip(remote.slots()).enumerate() {
        let (a, b) = match (a, b) {
            (None, other) | (other, None) => {
                if let Some(slot) = other {
                    merged.set(index, slot);
                }
                continue;
            }
            (Some(a), Some(b)) => (a, b),
        };

        let b = match b {
            Slot::State(State::MustBeRest) => {
                return Err(MergeError::RemoteMustBeRest { slot: index });
            }
            Slot::Segment(_) => return Err(MergeError::RemoteSegment { slot: index }),
            Slot::State(b) => b,
        };

        let slot = match a {
            Slot::State(a) => {
                let (state, conflict) = State::merge(a, b);
                if conflict {
                    let diagnostic = Diagnostic::MergeConflict {
                        slot: index,
                        at: local.time_for_slot(index),
                        local: a,
                        remote: b,
                        resolved: state,
                    };
                    diagnostic.emit();
                    diagnostics.push(diagnostic);
                }
                Slot::State(state)
            }
            Slot::Segment(id) if b == State::MayBeRest => Slot::Segment(id),
            Slot::Segment(id) => {
                merged.segment_mut(id).yield_rest_slot();
                Slot::State(b)
            }
        };
        merged.set(index, slot);
    }

    tracing::debug!(
        slots = merged.len(),
        conflicts = diagnostics.len(),
        "merged local and remote timelines"
    );

    Ok(Merged {
        timeline: merged,
        diagnostics,
    })
}

fn check_aligned(local: &Timeline, remote: &Timeline) -> Result<(), MergeError> {
    if local.grid() != remote.grid() {
        return Err(MergeError::GridMismatch {
            local: local.grid().step_seconds(),
            remote: remote.grid().step_seconds(),
        });
    }
    if local.span() != remote.span() || local.len() != remote.len() {
        return Err(MergeError::Misaligned {
            local_first: local.first_time(),
            local_last: local.last_time(),
            local_len: local.len(),
            remote_first: remote.first_time(),
            remote_last: remote.last_time(),
            remote_len: remote.len(),
        });
    }
    Ok(())
}
