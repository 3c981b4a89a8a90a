//! Work log line grammar.
//!
//! A log is a sequence of timestamp lines (`2024-01-01_09-00-00 ...`)
//! separated by free text. Between two timestamps, `rest` annotations say
//! how the gap should be counted.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use thiserror::Error;

/// Format of the leading timestamp token.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9_-]+").unwrap());
static REST_MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rest +([0-9]+) +min").unwrap());
static REST_DEFINITE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^rest\s*$").unwrap());
static REST_UNCERTAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rest *\?+\s*$").unwrap());

/// Errors from reading a single line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineError {
    /// A leading token looked like a timestamp but did not parse.
    #[error("malformed timestamp {token:?}")]
    MalformedTimestamp { token: String },

    /// A rest annotation declared more minutes than we can count.
    #[error("rest minute count {value:?} is out of range")]
    RestMinutesOutOfRange { value: String },
}

/// Category of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Timestamp(NaiveDateTime),
    /// `rest <N> min ...`
    RestMinutes(i64),
    /// A bare `rest`.
    Rest,
    /// `rest ???`
    RestUncertain,
    Other,
}

/// Categorizes one line.
///
/// Line terminators are ignored. A line whose leading `[0-9_-]` run does not
/// parse as a full timestamp is an error rather than an ordinary line.
pub fn classify_line(line: &str) -> Result<LineKind, LineError> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return Ok(LineKind::Blank);
    }

    if let Some(ts) = leading_timestamp(line)? {
        return Ok(LineKind::Timestamp(ts));
    }

    if let Some(caps) = REST_MINUTES_RE.captures(line) {
        let value = &caps[1];
        let minutes = value
            .parse()
            .map_err(|_| LineError::RestMinutesOutOfRange {
                value: value.to_string(),
            })?;
        return Ok(LineKind::RestMinutes(minutes));
    }

    if REST_DEFINITE_RE.is_match(line) {
        return Ok(LineKind::Rest);
    }

    if REST_UNCERTAIN_RE.is_match(line) {
        return Ok(LineKind::RestUncertain);
    }

    Ok(LineKind::Other)
}

/// Parses the leading timestamp of a line, if the line starts with one.
pub fn leading_timestamp(line: &str) -> Result<Option<NaiveDateTime>, LineError> {
    let Some(token) = TIMESTAMP_RE.find(line) else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(token.as_str(), TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|_| LineError::MalformedTimestamp {
            token: token.as_str().to_string(),
        })
}
