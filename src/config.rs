//! Run settings: an optional TOML file merged with command-line overrides.
//!
//! ```toml
//! mode = "heuristiclong"
//! labels = ["greedy", "tabu"]
//! time_limit = 60
//! filter = 'Dataset == "pisinger2005"'
//! ```

use crate::Result;
use crate::diagnostics;
use crate::metrics::DEFAULT_RESOLUTION;
use crate::model::Mode;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIME_LIMIT: f64 = 3600.0;
pub const DEFAULT_FILTER: &str = "true";
pub const DEFAULT_DATA: &str = "data/data.csv";
pub const DEFAULT_OUTPUT: &str = "output";
pub const DEFAULT_OUT: &str = "analysis";

/// Every field optional; the same shape serves the file and the CLI layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialSettings {
    pub mode: Option<Mode>,
    pub labels: Vec<String>,
    pub time_limit: Option<f64>,
    pub resolution: Option<usize>,
    pub filter: Option<String>,
    /// Reference table.
    pub data: Option<PathBuf>,
    /// Root of the `<label>/<Dataset>/<Path>.json` trace tree.
    pub output: Option<PathBuf>,
    /// Directory receiving the report files.
    pub out: Option<PathBuf>,
    pub jobs: Option<usize>,
}

impl PartialSettings {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("reading config {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| diagnostics::error_message(format!("read config {}", path.display())))?;
        Self::from_toml(&text)
            .with_context(|| diagnostics::error_message(format!("parse config {}", path.display())))
    }

    /// Values set in `over` win; an empty label list does not override.
    pub fn merge(self, over: PartialSettings) -> PartialSettings {
        PartialSettings {
            mode: over.mode.or(self.mode),
            labels: if over.labels.is_empty() {
                self.labels
            } else {
                over.labels
            },
            time_limit: over.time_limit.or(self.time_limit),
            resolution: over.resolution.or(self.resolution),
            filter: over.filter.or(self.filter),
            data: over.data.or(self.data),
            output: over.output.or(self.output),
            out: over.out.or(self.out),
            jobs: over.jobs.or(self.jobs),
        }
    }

    /// Fill defaults and check what has no default.
    pub fn resolve(self) -> Result<Settings> {
        let Some(mode) = self.mode else {
            bail!("{}", diagnostics::error_message("no benchmark mode given"));
        };
        if self.labels.is_empty() {
            bail!("{}", diagnostics::error_message("no labels given"));
        }
        Ok(Settings {
            mode,
            labels: self.labels,
            time_limit: self.time_limit.unwrap_or(DEFAULT_TIME_LIMIT),
            resolution: self.resolution.unwrap_or(DEFAULT_RESOLUTION),
            filter: self.filter.unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            data: self.data.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA)),
            output: self.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            out: self.out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT)),
            jobs: self.jobs.unwrap_or(1).max(1),
        })
    }
}

/// Fully resolved settings of one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: Mode,
    pub labels: Vec<String>,
    pub time_limit: f64,
    pub resolution: usize,
    pub filter: String,
    pub data: PathBuf,
    pub output: PathBuf,
    pub out: PathBuf,
    pub jobs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_values_fill_defaults() {
        let file = PartialSettings::from_toml(
            r#"
            mode = "primaldual"
            labels = ["a", "b"]
            time_limit = 60
            "#,
        )
        .unwrap();
        let s = file.resolve().unwrap();
        assert_eq!(s.mode, Mode::PrimalDual);
        assert_eq!(s.labels, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(s.time_limit, 60.0);
        assert_eq!(s.resolution, 1000);
        assert_eq!(s.filter, "true");
        assert_eq!(s.data, PathBuf::from("data/data.csv"));
        assert_eq!(s.jobs, 1);
    }

    #[test]
    fn cli_overrides_file() {
        let file = PartialSettings::from_toml(
            r#"
            mode = "exact"
            labels = ["a"]
            filter = "Type == 1"
            jobs = 4
            "#,
        )
        .unwrap();
        let cli = PartialSettings {
            mode: Some(Mode::Bound),
            time_limit: Some(10.0),
            ..PartialSettings::default()
        };
        let s = file.merge(cli).resolve().unwrap();
        assert_eq!(s.mode, Mode::Bound);
        assert_eq!(s.labels, vec!["a".to_string()]);
        assert_eq!(s.filter, "Type == 1");
        assert_eq!(s.time_limit, 10.0);
        assert_eq!(s.jobs, 4);
    }

    #[test]
    fn mode_and_labels_are_required() {
        assert!(PartialSettings::default().resolve().is_err());
        let no_labels = PartialSettings {
            mode: Some(Mode::Exact),
            ..PartialSettings::default()
        };
        assert!(no_labels.resolve().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PartialSettings::from_toml("timelimit = 3").is_err());
        assert!(PartialSettings::from_toml(r#"mode = "fast""#).is_err());
    }
}
