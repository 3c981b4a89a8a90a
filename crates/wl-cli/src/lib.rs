//! Work log CLI library.
//!
//! This crate provides the CLI interface for the work log analyser.

mod cli;
pub mod commands;
mod config;
pub mod input;
pub mod targets;

pub use cli::{Cli, Commands, ReportArgs};
pub use config::Config;
