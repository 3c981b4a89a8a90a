//! Note command: turns a pasted log fragment into a rest annotation.
//!
//! Reads lines from stdin and echoes them, inserting `rest N min` before the
//! last line, where N covers the time from the first to the last timestamp.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use wl_core::leading_timestamp;

/// Slack added to the measured span before rounding up to minutes.
const SLACK_SECONDS: i64 = 10;

/// Minutes covered by a fragment, rounded up.
fn rest_minutes(seconds: i64) -> i64 {
    (seconds + SLACK_SECONDS + 59).div_euclid(60)
}

/// Inserts the rest annotation into `lines`.
///
/// Fragments that do not start and end with a timestamp are echoed
/// unchanged.
pub fn annotate(lines: &[String]) -> Result<Vec<String>> {
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return Ok(Vec::new());
    };
    let first_ts = leading_timestamp(first).context("bad timestamp on the first line")?;
    let last_ts = leading_timestamp(last).context("bad timestamp on the last line")?;

    let mut output = lines[..lines.len() - 1].to_vec();
    if let (Some(first_ts), Some(last_ts)) = (first_ts, last_ts) {
        let minutes = rest_minutes((last_ts - first_ts).num_seconds());
        output.extend([String::new(), format!("rest {minutes} min"), String::new()]);
    }
    output.push(last.clone());
    Ok(output)
}

/// Runs the note command on stdin.
pub fn run() -> Result<()> {
    let lines: Vec<String> = std::io::stdin()
        .lock()
        .lines()
        .collect::<Result<_, _>>()
        .context("failed to read stdin")?;

    let mut stdout = std::io::stdout().lock();
    for line in annotate(&lines)? {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}
