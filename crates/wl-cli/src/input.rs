//! Reading work log files into line sequences.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Name prefix of daily log files.
pub const LOG_PREFIX: &str = "winlog_";

/// Line placed between two concatenated files.
const FILE_SEPARATOR: &str = "rest";

/// Reads a file as lines, skipping bytes that are not valid UTF-8.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.replace('\u{FFFD}', ""))
        .collect())
}

/// Reads several files as one sequence.
///
/// The time between two files is unlogged, so a `rest` line is inserted at
/// every file boundary.
pub fn read_files(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            lines.push(FILE_SEPARATOR.to_string());
        }
        lines.extend(read_lines(path)?);
    }
    Ok(lines)
}

/// Reads a file if it exists.
pub fn read_optional(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no such file, treating source as absent");
        return Ok(None);
    }
    read_lines(path).map(Some)
}

/// Reduces an argument to a date suffix.
///
/// Anything up to and including the last `winlog_` is dropped, so both
/// `2024-01-05` and `~/worklog/winlog_2024-01-05` give `2024-01-05`.
pub fn date_suffix(arg: &str) -> &str {
    arg.rfind(LOG_PREFIX)
        .map_or(arg, |index| &arg[index + LOG_PREFIX.len()..])
}

/// Local and remote log paths for one date suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixPaths {
    pub local: PathBuf,
    pub remote: PathBuf,
}

impl SuffixPaths {
    pub fn new(log_dir: &Path, suffix: &str) -> Self {
        let local = log_dir.join(format!("{LOG_PREFIX}{suffix}"));
        let remote = log_dir.join(format!("{LOG_PREFIX}{suffix}.remote"));
        Self { local, remote }
    }
}

/// Base name used to label a source in reports and diagnostics.
pub fn source_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
