//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wl_core::{DEFAULT_DAY_START_HOUR, DEFAULT_SLOT_SECONDS, DEFAULT_TARGET_HOURS, SlotGrid};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `winlog_<suffix>` files.
    pub log_dir: PathBuf,
    /// Width of one slot in seconds.
    pub slot_seconds: i64,
    /// Work target for days missing from the target table.
    pub default_target_hours: f64,
    /// Hour at which a logical day begins.
    pub day_start_hour: u32,
    /// Optional per-day target table (YAML or TOML).
    pub target_table: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_dir: home.join("worklog"),
            slot_seconds: DEFAULT_SLOT_SECONDS,
            default_target_hours: DEFAULT_TARGET_HOURS,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            target_table: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later layers win: defaults, the user config file, `path`, then `WL_*`
    /// environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("WL_"));

        figment.extract()
    }

    /// The slot grid described by `slot_seconds`.
    pub fn grid(&self) -> Result<SlotGrid> {
        SlotGrid::new(self.slot_seconds).context("invalid slot_seconds in configuration")
    }

    /// Start of a logical day.
    pub fn day_start(&self) -> Result<NaiveTime> {
        NaiveTime::from_hms_opt(self.day_start_hour, 0, 0).with_context(|| {
            format!(
                "invalid day_start_hour in configuration: {}",
                self.day_start_hour
            )
        })
    }
}

/// Returns the platform-specific config directory for wl.
///
/// On Linux: `~/.config/worklog`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("worklog"))
}
