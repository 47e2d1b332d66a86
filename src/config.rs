//! Pipeline configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "population_cleaner.toml";

pub const DEFAULT_INPUT: &str = "messy_population_data.csv";
pub const DEFAULT_OUTPUT: &str = "cleaned_population_data.csv";

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Optional JSON run report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            report_path: None,
        }
    }
}

impl CleanConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Use [`CONFIG_FILE`] from `dir` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            info!("using config {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CleanConfig::default();
        assert_eq!(cfg.input_path, PathBuf::from("messy_population_data.csv"));
        assert_eq!(cfg.output_path, PathBuf::from("cleaned_population_data.csv"));
        assert!(cfg.report_path.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "output_path = \"out/clean.csv\"\n",
        )
        .unwrap();

        let cfg = CleanConfig::discover(dir.path()).unwrap();
        assert_eq!(cfg.input_path, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(cfg.output_path, PathBuf::from("out/clean.csv"));
    }

    #[test]
    fn test_discover_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(CleanConfig::discover(dir.path()).unwrap(), CleanConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "input_path = [").unwrap();
        assert!(CleanConfig::load(&path).is_err());
    }
}
