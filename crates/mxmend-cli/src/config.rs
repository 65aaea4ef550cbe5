//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use mxmend::{MxmendError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for MxmendError {
    fn from(err: ConfigError) -> Self {
        MxmendError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (mxmend/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or holds invalid values
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, MxmendError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("mxmend/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "mxmend", "mxmend") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
/// - A value is out of range
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, MxmendError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.repair().max_passes() == 0 {
        return Err(ConfigError::Validation(
            "repair.max_passes must be at least 1".to_string(),
        ));
    }
    let margin = config.resolve().margin();
    if margin.is_nan() || margin < 0.0 {
        return Err(ConfigError::Validation(format!(
            "resolve.margin must be a non-negative number, got {margin}"
        )));
    }
    if let Some(rule) = config
        .validate()
        .zones()
        .iter()
        .find(|rule| !zone_bounds_are_valid(rule.min_fraction(), rule.max_fraction()))
    {
        return Err(ConfigError::Validation(format!(
            "zone `{}` bounds must lie in 0..=1 with min_fraction <= max_fraction",
            rule.keyword()
        )));
    }
    Ok(())
}

fn zone_bounds_are_valid(min_fraction: Option<f64>, max_fraction: Option<f64>) -> bool {
    let in_unit = |bound: Option<f64>| bound.is_none_or(|value| (0.0..=1.0).contains(&value));
    let ordered = match (min_fraction, max_fraction) {
        (Some(min), Some(max)) => min <= max,
        _ => true,
    };
    in_unit(min_fraction) && in_unit(max_fraction) && ordered
}
