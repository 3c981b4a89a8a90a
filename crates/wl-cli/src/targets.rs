//! Per-day work targets.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Format, Toml, Yaml};

/// Target hours keyed by day name, with a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetTable {
    default_hours: f64,
    hours: BTreeMap<String, f64>,
}

impl TargetTable {
    /// A table without entries; every day gets `default_hours`.
    pub const fn uniform(default_hours: f64) -> Self {
        Self {
            default_hours,
            hours: BTreeMap::new(),
        }
    }

    /// Loads a `{ 'YYYY-MM-DD': hours }` map from a YAML or TOML file.
    ///
    /// Files ending in `.toml` are read as TOML, everything else as YAML.
    pub fn load(path: &Path, default_hours: f64) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("target table {} does not exist", path.display());
        }
        let figment = if path.extension().is_some_and(|ext| ext == "toml") {
            Figment::from(Toml::file(path))
        } else {
            Figment::from(Yaml::file(path))
        };
        let hours: BTreeMap<String, f64> = figment
            .extract()
            .with_context(|| format!("failed to load target table {}", path.display()))?;
        tracing::debug!(path = %path.display(), entries = hours.len(), "loaded target table");
        Ok(Self {
            default_hours,
            hours,
        })
    }

    pub const fn default_hours(&self) -> f64 {
        self.default_hours
    }

    /// Target for a day name.
    ///
    /// Names are reduced to the part after their last `_` and `/`, so file
    /// names such as `winlog_2024-01-05` find the `2024-01-05` entry.
    pub fn hours_for(&self, name: &str) -> f64 {
        self.hours
            .get(day_key(name))
            .copied()
            .unwrap_or(self.default_hours)
    }
}

fn day_key(name: &str) -> &str {
    let name = name.rsplit_once('_').map_or(name, |(_, rest)| rest);
    name.rsplit_once('/').map_or(name, |(_, rest)| rest)
}
