// Configuration for handlehunt
// Optional TOML file with defaults; the scanner only ever sees an explicit ScanConfig

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "handlehunt.toml";

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 10;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_MAX_SITES: usize = 100;

/// Settings for one batch, passed to the scanner by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub concurrent_requests: usize,
    pub timeout_secs: u64,
    pub max_sites: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_sites: DEFAULT_MAX_SITES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub database: PathBuf,
    pub reports: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("wmn-data.json"),
            reports: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub paths: PathsConfig,
}

impl AppConfig {
    /// Check value ranges. Called after CLI overrides are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "concurrent_requests",
            self.search.concurrent_requests as u64,
            MIN_CONCURRENCY as u64,
            MAX_CONCURRENCY as u64,
        )?;
        check_range(
            "timeout_secs",
            self.search.timeout_secs,
            MIN_TIMEOUT_SECS,
            MAX_TIMEOUT_SECS,
        )?;
        check_range("max_sites", self.search.max_sites as u64, 1, u32::MAX as u64)?;
        Ok(())
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            concurrency: self.search.concurrent_requests,
            timeout: Duration::from_secs(self.search.timeout_secs),
        }
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Load config from `path`, or defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("config {} not found, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}
