use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use form_store::{ApiOptions, DEFAULT_FAILURE_PROBABILITY, DEFAULT_LATENCY};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Optional settings file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "form-builder.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory given and no home directory to derive one from")]
    NoDataDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failure probability must be within 0..=1, got {0}")]
    InvalidProbability(f64),
}

/// Values taken from the command line or the environment; they win over
/// the settings file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub latency_ms: Option<u64>,
    pub failure_probability: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    latency_ms: Option<u64>,
    failure_probability: Option<f64>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    pub data_dir: PathBuf,
    pub api: ApiOptions,
}

impl BuilderConfig {
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let data_dir = match &overrides.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };
        let file = load_file_config(&data_dir.join(CONFIG_FILE_NAME))?;

        let latency = overrides
            .latency_ms
            .or(file.latency_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LATENCY);
        let failure_probability = overrides
            .failure_probability
            .or(file.failure_probability)
            .unwrap_or(DEFAULT_FAILURE_PROBABILITY);
        if !(0.0..=1.0).contains(&failure_probability) {
            return Err(ConfigError::InvalidProbability(failure_probability));
        }

        let config = Self {
            data_dir,
            api: ApiOptions {
                latency,
                failure_probability,
            },
        };
        debug!(?config, "resolved configuration");
        Ok(config)
    }
}

fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "formbuilder", "form-builder").map(|dirs| dirs.data_dir().to_path_buf())
}

fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_apply_under_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "latency_ms = 5\nfailure_probability = 0.5\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            latency_ms: None,
            failure_probability: Some(0.0),
        };
        let config = BuilderConfig::resolve(&overrides).unwrap();
        assert_eq!(config.api.latency, Duration::from_millis(5));
        assert_eq!(config.api.failure_probability, 0.0);
    }

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let config = BuilderConfig::resolve(&overrides).unwrap();
        assert_eq!(config.api, ApiOptions::default());
    }

    #[test]
    fn rejects_bad_probability_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            failure_probability: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            BuilderConfig::resolve(&overrides),
            Err(ConfigError::InvalidProbability(_))
        ));

        fs::write(dir.path().join(CONFIG_FILE_NAME), "colour = \"red\"\n").unwrap();
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(
            BuilderConfig::resolve(&overrides),
            Err(ConfigError::Parse { .. })
        ));
    }
}
