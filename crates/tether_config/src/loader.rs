//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::TetherConfig;
use std::path::Path;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "tether.toml";

/// Loads `<project_dir>/tether.toml`, falling back to defaults if it is absent.
pub fn load_config(project_dir: &Path) -> Result<TetherConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "no configuration file, using defaults");
        return Ok(TetherConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads an explicitly named configuration file, which must exist.
pub fn load_config_file(path: &Path) -> Result<TetherConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    load_config_from_str(&content)
}

/// Parses and validates a `tether.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<TetherConfig, ConfigError> {
    let config: TetherConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &TetherConfig) -> Result<(), ConfigError> {
    if config.probe.core.is_empty() {
        return Err(ConfigError::Invalid {
            field: "probe.core",
            reason: "debug core instance path must not be empty".to_string(),
        });
    }
    if config.probe.port.is_empty() || config.probe.port.contains('/') {
        return Err(ConfigError::Invalid {
            field: "probe.port",
            reason: format!("'{}' is not a port name", config.probe.port),
        });
    }
    let depth = config.defaults.probe_depth;
    if depth == 0 || !depth.is_power_of_two() {
        return Err(ConfigError::Invalid {
            field: "defaults.probe_depth",
            reason: format!("{depth} is not a power of two"),
        });
    }
    if config.defaults.clk_net.is_empty() {
        return Err(ConfigError::Invalid {
            field: "defaults.clk_net",
            reason: "clock net must not be empty".to_string(),
        });
    }
    if config.paths.work_dir.is_empty() {
        return Err(ConfigError::Invalid {
            field: "paths.work_dir",
            reason: "work directory must not be empty".to_string(),
        });
    }
    Ok(())
}
