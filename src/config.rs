use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::map::MapSettings;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self { min: 0, max: 17, default: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    /// Capacity slider of the data preview.
    pub capacity: SliderConfig,
    pub map: MapSettings,
    pub window_size: [f32; 2],
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub log_filter: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("assets/Airbnb_Locations.csv"),
            model_path: PathBuf::from("assets/pipeline_model.json"),
            capacity: SliderConfig::default(),
            map: MapSettings::default(),
            window_size: [1280.0, 900.0],
            log_filter: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` if given, otherwise `dashboard.toml` when it exists, otherwise defaults.
    ///
    /// An explicitly named file that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml_str(&text, &path),
            Err(source) if required || source.kind() != std::io::ErrorKind::NotFound => {
                Err(ConfigError::Read { path, source })
            }
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.capacity;
        if s.min > s.max || !(s.min..=s.max).contains(&s.default) {
            return Err(ConfigError::Invalid(format!(
                "capacity slider {}..={} cannot default to {}",
                s.min, s.max, s.default
            )));
        }
        if self.map.cluster_radius_px <= 0.0 {
            return Err(ConfigError::Invalid("map.cluster_radius_px must be positive".into()));
        }
        Ok(())
    }
}
