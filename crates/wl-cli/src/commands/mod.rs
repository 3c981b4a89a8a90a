//! CLI subcommand implementations.

pub mod note;
pub mod report;
pub mod time_table;
