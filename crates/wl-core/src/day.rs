//! Splitting a multi-day log into logical days.
//!
//! A logical day starts at a configurable time of day (early morning by
//! default), so work past midnight still belongs to the previous date.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveTime};
use thiserror::Error;

use crate::line::{LineError, leading_timestamp};

/// Default start of a logical day.
pub const DEFAULT_DAY_START_HOUR: u32 = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line_no}: {error}")]
pub struct SplitError {
    pub line_no: usize,
    #[source]
    pub error: LineError,
}

/// The lines of one logical day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLog {
    pub date: NaiveDate,
    pub lines: Vec<String>,
}

impl DayLog {
    /// Date key used in target tables, `YYYY-MM-DD`.
    #[must_use]
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Groups lines by the logical day of the closest preceding timestamp.
///
/// Lines before the first timestamp have no day and are dropped.
pub fn split_by_day<S: AsRef<str>>(
    lines: &[S],
    day_start: NaiveTime,
) -> Result<Vec<DayLog>, SplitError> {
    let mut days: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    let mut current: Option<NaiveDate> = None;

    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let stamp =
            leading_timestamp(line).map_err(|error| SplitError { line_no: i + 1, error })?;
        if let Some(ts) = stamp {
            let date = if ts.time() < day_start {
                ts.date().checked_sub_days(Days::new(1)).unwrap_or(ts.date())
            } else {
                ts.date()
            };
            current = Some(date);
        }
        match current {
            Some(date) => days.entry(date).or_default().push(line.to_string()),
            None => tracing::warn!(line_no = i + 1, line, "skipping line before the first timestamp"),
        }
    }

    Ok(days
        .into_iter()
        .map(|(date, lines)| DayLog { date, lines })
        .collect())
}
