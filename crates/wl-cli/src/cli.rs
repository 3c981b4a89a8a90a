//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Work log analyser.
///
/// Reads plain-text work logs, classifies every 15 seconds as work or rest,
/// merges a local log with a remote one, and reports totals against a daily
/// target.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyse work logs and print work/rest reports.
    Report(ReportArgs),

    /// Print a YAML target table for a whole year.
    TimeTable {
        /// Calendar year.
        #[arg(long)]
        year: i32,

        /// Target for Monday to Friday; weekends get zero.
        #[arg(long, default_value_t = 6.0)]
        weekday_hours: f64,
    },

    /// Annotate a pasted log fragment (read from stdin) with its duration as
    /// a `rest N min` line.
    Note,
}

/// Options of `wl report`.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Log files (split into days), or date suffixes with --date-suffix.
    ///
    /// Defaults to today's log in the configured log directory.
    pub inputs: Vec<String>,

    /// Remote log files, matched to the local days by date.
    #[arg(long, conflicts_with = "date_suffix")]
    pub remote: Vec<PathBuf>,

    /// Treat inputs as date suffixes of `winlog_<suffix>` files in the log
    /// directory; `winlog_<suffix>.remote` is read as the remote log.
    #[arg(long)]
    pub date_suffix: bool,

    /// Also print the slot-by-slot table of all timelines.
    #[arg(long)]
    pub whole_table: bool,

    /// Print only a coarse list of the merged timeline.
    #[arg(long)]
    pub short: bool,

    /// YAML or TOML table of per-day target hours.
    #[arg(long)]
    pub target_table: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
