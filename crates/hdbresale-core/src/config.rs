//! Pipeline configuration, read once at start from a TOML document.
//!
//! Every key has a default, so an empty document is a valid configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::normalize::RowPolicy;

/// Accepted spacing between geocoding requests, in milliseconds.
pub const MIN_DELAY_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub etl: EtlConfig,
    pub geocode: GeocodeConfig,
    pub geocode_combine: CombineConfig,
}

/// Raw CSV → normalized artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// A CSV file, or a directory whose `*.csv` files are concatenated.
    pub csv_path: PathBuf,
    pub artifacts_path: PathBuf,
    pub artifact_file: String,
    pub row_policy: RowPolicy,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/raw"),
            artifacts_path: PathBuf::from("artifacts"),
            artifact_file: "hdb_resale.parquet".into(),
            row_policy: RowPolicy::Abort,
        }
    }
}

impl EtlConfig {
    pub fn artifact_path(&self) -> PathBuf {
        self.artifacts_path.join(&self.artifact_file)
    }
}

/// Batched geocoding of one CSV file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub csv_path: PathBuf,
    pub batch_size: usize,
    pub artifacts_path: PathBuf,
    pub min_delay_ms: u64,
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/raw/2015.csv"),
            batch_size: 500,
            artifacts_path: PathBuf::from("artifacts/geocode"),
            min_delay_ms: 1000,
            endpoint: "https://nominatim.openstreetmap.org".into(),
            user_agent: "hdbresale".into(),
        }
    }
}

impl GeocodeConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

/// Geocoded part files → one artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    pub geocode_files_path: PathBuf,
    pub artifacts_path: PathBuf,
    pub artifact_file: String,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            geocode_files_path: PathBuf::from("artifacts/geocode"),
            artifacts_path: PathBuf::from("artifacts"),
            artifact_file: "2015_geocoded.parquet".into(),
        }
    }
}

impl CombineConfig {
    pub fn artifact_path(&self) -> PathBuf {
        self.artifacts_path.join(&self.artifact_file)
    }
}

impl Config {
    /// Read and validate a config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.geocode.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "geocode.batch_size must be greater than 0".into(),
            ));
        }
        if !MIN_DELAY_RANGE_MS.contains(&self.geocode.min_delay_ms) {
            return Err(ConfigError::Invalid(format!(
                "geocode.min_delay_ms must be within {}..={}, got {}",
                MIN_DELAY_RANGE_MS.start(),
                MIN_DELAY_RANGE_MS.end(),
                self.geocode.min_delay_ms
            )));
        }
        if self.etl.artifact_file.is_empty() || self.geocode_combine.artifact_file.is_empty() {
            return Err(ConfigError::Invalid("artifact_file must not be empty".into()));
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
