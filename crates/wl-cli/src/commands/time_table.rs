//! Time-table command: a YAML target table for a calendar year.

use std::fmt::Write;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};

/// Formats one `'YYYY-MM-DD': hours` line per day of `year`.
///
/// Weekdays get `weekday_hours`, weekends zero.
pub fn format_time_table(year: i32, weekday_hours: f64) -> Result<String> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        anyhow::bail!("year {year} is out of range");
    };

    let mut output = String::new();
    for date in first.iter_days().take_while(|d| d.year() == year) {
        let hours = match date.weekday() {
            Weekday::Sat | Weekday::Sun => 0.0,
            _ => weekday_hours,
        };
        writeln!(output, "'{}': {hours:.1}", date.format("%Y-%m-%d")).unwrap();
    }
    Ok(output)
}

/// Runs the time-table command.
pub fn run(year: i32, weekday_hours: f64) -> Result<()> {
    print!("{}", format_time_table(year, weekday_hours)?);
    Ok(())
}
