//! Report command for work/rest reports.
//!
//! This module implements `wl report`: reading log files (or date suffixes),
//! splitting them into days, analysing every day and printing run lists, an
//! optional slot table, totals and target projections (human-readable or
//! JSON).

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use wl_core::{
    Analysis, DayInput, Diagnostic, Slot, SlotGrid, SlotTotals, SourceLines, TimeInfo, Timeline,
    analyze_days, split_by_day,
};

use crate::cli::ReportArgs;
use crate::config::Config;
use crate::input::{SuffixPaths, date_suffix, read_files, read_lines, read_optional, source_name};
use crate::targets::TargetTable;

/// Runs of at most this many minutes are hidden from shortened lists.
const SHORT_LIST_MINUTES: i64 = 2;
/// Same, with `--short`.
const VERY_SHORT_LIST_MINUTES: i64 = 10;
/// Rest runs up to this many minutes are not listed as rests.
const MIN_LISTED_REST_MINUTES: i64 = 2;

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub whole_table: bool,
    pub short: bool,
}

/// Lines of one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub lines: Vec<String>,
}

/// The sources of one reported day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySources {
    pub name: String,
    pub local: Option<Source>,
    pub remote: Option<Source>,
}

/// One analysed day.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub name: String,
    pub analysis: Analysis,
    pub time: TimeInfo,
}

// ========== Gathering Inputs ==========

/// Reads files and groups their lines into days.
///
/// Remote files are split the same way and paired with local days by date.
pub fn file_sources(
    local: &[PathBuf],
    remote: &[PathBuf],
    day_start: NaiveTime,
) -> Result<Vec<DaySources>> {
    let mut days: BTreeMap<NaiveDate, DaySources> = BTreeMap::new();

    let mut add = |paths: &[PathBuf], is_remote: bool| -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let lines = read_files(paths)?;
        let split = split_by_day(&lines, day_start).context("failed to split log into days")?;
        for day in split {
            let key = day.key();
            let entry = days.entry(day.date).or_insert_with(|| DaySources {
                name: key.clone(),
                local: None,
                remote: None,
            });
            if is_remote {
                entry.remote = Some(Source {
                    name: format!("{key}.remote"),
                    lines: day.lines,
                });
            } else {
                entry.local = Some(Source {
                    name: key,
                    lines: day.lines,
                });
            }
        }
        Ok(())
    };
    add(local, false)?;
    add(remote, true)?;

    Ok(days.into_values().collect())
}

/// Reads `winlog_<suffix>` and `winlog_<suffix>.remote` for every suffix.
pub fn suffix_sources(log_dir: &Path, suffixes: &[String]) -> Result<Vec<DaySources>> {
    suffixes
        .iter()
        .map(|arg| -> Result<DaySources> {
            let suffix = date_suffix(arg);
            let paths = SuffixPaths::new(log_dir, suffix);
            tracing::debug!(suffix, local = %paths.local.display(), remote = %paths.remote.display(), "date suffix");
            let local = read_lines(&paths.local)?;
            let remote = read_optional(&paths.remote)?;
            Ok(DaySources {
                name: suffix.to_string(),
                local: Some(Source {
                    name: source_name(&paths.local),
                    lines: local,
                }),
                remote: remote.map(|lines| Source {
                    name: source_name(&paths.remote),
                    lines,
                }),
            })
        })
        .collect()
}

/// Analyses all days; days without any timestamp are dropped.
pub fn analyse(
    days: Vec<DaySources>,
    grid: SlotGrid,
    targets: &TargetTable,
) -> Result<Vec<DayReport>> {
    let inputs: Vec<DayInput<'_, String>> = days
        .iter()
        .map(|day| DayInput {
            local: day
                .local
                .as_ref()
                .map(|s| SourceLines::new(&s.name, &s.lines)),
            remote: day
                .remote
                .as_ref()
                .map(|s| SourceLines::new(&s.name, &s.lines)),
        })
        .collect();
    let analyses = analyze_days(&inputs, grid).context("failed to analyse work log")?;

    let mut reports = Vec::new();
    for (day, analysis) in days.into_iter().zip(analyses) {
        let Some(analysis) = analysis else {
            tracing::warn!(day = %day.name, "no timestamps, skipping day");
            continue;
        };
        let time = TimeInfo::new(analysis.totals, targets.hours_for(&day.name), &grid);
        reports.push(DayReport {
            name: day.name,
            analysis,
            time,
        });
    }
    Ok(reports)
}

// ========== Formatting ==========

/// Formats a duration as `H:MM`, or `H:MM:SS` with seconds.
/// Negative durations keep their sign.
pub fn format_duration(duration: Duration, with_seconds: bool) -> String {
    let sign = if duration < Duration::zero() { "-" } else { "" };
    let seconds = duration.num_seconds().abs();
    let (h, m, s) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if with_seconds {
        format!("{sign}{h}:{m:02}:{s:02}")
    } else {
        format!("{sign}{h}:{m:02}")
    }
}

fn slot_label(slot: Option<Slot>, timeline: &Timeline) -> String {
    match slot {
        None => "-".to_string(),
        Some(Slot::State(state)) => state.label().to_string(),
        Some(Slot::Segment(id)) => timeline.segment(id).label(&timeline.grid()),
    }
}

fn heading(output: &mut String, title: &str, rule: char) {
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", rule.to_string().repeat(title.chars().count())).unwrap();
}

/// Lists runs of equal slots.
///
/// With `hide_up_to`, runs of at most that many minutes are left out.
pub fn format_run_list(timeline: Option<&Timeline>, hide_up_to: Option<i64>) -> String {
    let mut output = String::new();
    let Some(timeline) = timeline else {
        writeln!(output, "No data").unwrap();
        return output;
    };

    let mut rests = Vec::new();
    for run in timeline.runs() {
        let first = timeline.time_for_slot(run.start);
        let last = timeline.time_for_slot(run.end - 1);
        let minutes = (last - first).num_minutes();

        if hide_up_to.is_none_or(|limit| minutes > limit) {
            writeln!(
                output,
                "{} => {}  ({minutes:3} min): {}",
                first.format("%H:%M:%S"),
                last.format("%H:%M:%S"),
                slot_label(run.slot, timeline)
            )
            .unwrap();
        }

        if matches!(run.slot, Some(Slot::State(state)) if state.is_rest())
            && minutes > MIN_LISTED_REST_MINUTES
        {
            rests.push(minutes);
        }
    }

    let grid = timeline.grid();
    let segment_rests: Vec<i64> = timeline
        .segments()
        .iter()
        .map(|segment| grid.duration_of(segment.rest_slots()).num_minutes())
        .collect();
    writeln!(output, "rests from lists: {rests:?}").unwrap();
    writeln!(output, "rests from special segments: {segment_rests:?}").unwrap();
    output
}

/// Prints every slot of the local, remote and merged timelines side by side.
pub fn format_table(analysis: &Analysis) -> String {
    let merged = &analysis.merged;
    let grid = merged.grid();
    let origin = merged.first_time();

    let cell = |timeline: Option<&Timeline>, index: usize| -> String {
        let Some(timeline) = timeline else {
            return String::new();
        };
        if merged.time_for_slot(index) < timeline.first_time() {
            return "-".to_string();
        }
        let own = grid.reindex(index, origin, timeline.first_time());
        slot_label(timeline.slot(own), timeline)
    };

    let mut rows = vec![[
        "time".to_string(),
        "local".to_string(),
        "remote".to_string(),
        "merged".to_string(),
    ]];
    for index in 0..merged.len() {
        rows.push([
            merged.time_for_slot(index).format("%H:%M:%S").to_string(),
            cell(analysis.local.as_ref(), index),
            cell(analysis.remote.as_ref(), index),
            slot_label(merged.slot(index), merged),
        ]);
    }

    let mut widths = [0; 3];
    for row in &rows {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut output = String::new();
    for [time, local, remote, merged_cell] in &rows {
        writeln!(
            output,
            "{time:<w0$}  {local:<w1$}  {remote:<w2$}  {merged_cell}",
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )
        .unwrap();
    }
    output
}

/// Formats totals and the target projection of one day.
pub fn format_time_info(time: &TimeInfo, now: NaiveDateTime) -> String {
    let mut output = String::new();
    let ratio = time
        .totals
        .rest_ratio()
        .map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"));

    writeln!(output, "rest from list:  {}", format_duration(time.rest_from_list, false)).unwrap();
    writeln!(output, "work from list:  {}", format_duration(time.work_from_list, false)).unwrap();
    writeln!(output, "total rest:      {}", format_duration(time.rest, false)).unwrap();
    writeln!(output, "total work:      {}", format_duration(time.work, false)).unwrap();
    writeln!(output, "rest ratio:      {ratio}").unwrap();
    writeln!(output, "target:          {} h", time.target_hours).unwrap();
    writeln!(output, "to target:       {}", format_duration(time.to_target, true)).unwrap();
    writeln!(
        output,
        "ideal finish:    {}",
        time.ideal_finish(now).format("%H:%M:%S")
    )
    .unwrap();
    output
}

/// Formats the full report of one day.
pub fn format_day(day: &DayReport, options: ReportOptions, now: NaiveDateTime) -> String {
    let analysis = &day.analysis;
    let mut output = String::new();
    heading(&mut output, &format!("DAY {}", day.name), '═');

    if !options.short {
        let lists = [
            ("LOCAL", analysis.local.as_ref()),
            ("REMOTE", analysis.remote.as_ref()),
            ("MERGED", Some(&analysis.merged)),
        ];
        for (title, timeline) in lists {
            writeln!(output).unwrap();
            heading(&mut output, title, '─');
            output.push_str(&format_run_list(timeline, None));
        }
    }

    let hide_up_to = if options.short {
        VERY_SHORT_LIST_MINUTES
    } else {
        SHORT_LIST_MINUTES
    };
    writeln!(output).unwrap();
    heading(&mut output, "MERGED (SHORTENED)", '─');
    output.push_str(&format_run_list(Some(&analysis.merged), Some(hide_up_to)));

    if options.whole_table {
        writeln!(output).unwrap();
        heading(&mut output, "TABLE", '─');
        output.push_str(&format_table(analysis));
    }

    if !analysis.diagnostics.is_empty() {
        writeln!(output).unwrap();
        heading(&mut output, "WARNINGS", '─');
        for diagnostic in &analysis.diagnostics {
            writeln!(output, "- {diagnostic}").unwrap();
        }
    }

    writeln!(output).unwrap();
    heading(&mut output, "TIME", '─');
    output.push_str(&format_time_info(&day.time, now));
    output
}

/// Sum of the projections over all days.
fn total_to_target(days: &[DayReport]) -> Duration {
    days.iter()
        .fold(Duration::zero(), |sum, day| sum + day.time.to_target)
}

#[allow(clippy::cast_precision_loss)]
fn in_target_days(total: Duration, default_target_hours: f64) -> Option<f64> {
    let day = wl_core::hours(default_target_hours).num_seconds();
    (day != 0).then(|| total.num_seconds() as f64 / day as f64)
}

/// Formats the projection summed over all days.
pub fn format_summary(days: &[DayReport], default_target_hours: f64) -> String {
    let total = total_to_target(days);
    let in_days = in_target_days(total, default_target_hours)
        .map_or_else(|| "n/a".to_string(), |d| format!("{d:.3}"));

    let mut output = String::new();
    heading(&mut output, "SUMMARY", '─');
    writeln!(output, "Days:              {}", days.len()).unwrap();
    writeln!(output, "To target (sum):   {}", format_duration(total, true)).unwrap();
    writeln!(output, "In target days:    {in_days}").unwrap();
    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub days: Vec<JsonDay>,
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
pub struct JsonDay {
    pub name: String,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub totals: SlotTotals,
    pub rest_seconds: i64,
    pub work_seconds: i64,
    pub rest_ratio: Option<f64>,
    pub target_hours: f64,
    pub to_target_seconds: i64,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub to_target_seconds: i64,
    pub to_target_days: Option<f64>,
}

/// Formats analysed days as JSON.
pub fn format_report_json(days: &[DayReport], default_target_hours: f64) -> Result<String> {
    let total = total_to_target(days);
    let report = JsonReport {
        days: days
            .iter()
            .map(|day| JsonDay {
                name: day.name.clone(),
                first: day.analysis.span.first,
                last: day.analysis.span.last,
                totals: day.analysis.totals,
                rest_seconds: day.time.rest.num_seconds(),
                work_seconds: day.time.work.num_seconds(),
                rest_ratio: day.analysis.totals.rest_ratio(),
                target_hours: day.time.target_hours,
                to_target_seconds: day.time.to_target.num_seconds(),
                diagnostics: day.analysis.diagnostics.clone(),
            })
            .collect(),
        summary: JsonSummary {
            to_target_seconds: total.num_seconds(),
            to_target_days: in_target_days(total, default_target_hours),
        },
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(config: &Config, args: &ReportArgs) -> Result<()> {
    let grid = config.grid()?;
    let targets = match args.target_table.as_ref().or(config.target_table.as_ref()) {
        Some(path) => TargetTable::load(path, config.default_target_hours)?,
        None => TargetTable::uniform(config.default_target_hours),
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    let sources = if args.date_suffix {
        let suffixes = if args.inputs.is_empty() {
            vec![today]
        } else {
            args.inputs.clone()
        };
        suffix_sources(&config.log_dir, &suffixes)?
    } else {
        let files = if args.inputs.is_empty() {
            vec![SuffixPaths::new(&config.log_dir, &today).local]
        } else {
            args.inputs.iter().map(Into::into).collect()
        };
        file_sources(&files, &args.remote, config.day_start()?)?
    };

    let days = analyse(sources, grid, &targets)?;
    if args.json {
        println!("{}", format_report_json(&days, targets.default_hours())?);
        return Ok(());
    }

    if days.is_empty() {
        println!("No timestamps found.");
        return Ok(());
    }

    let options = ReportOptions {
        whole_table: args.whole_table,
        short: args.short,
    };
    let now = Local::now().naive_local();
    for day in &days {
        print!("{}", format_day(day, options, now));
        println!();
    }
    print!("{}", format_summary(&days, targets.default_hours()));
    Ok(())
}
