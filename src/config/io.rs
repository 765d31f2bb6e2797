use std::path::Path;

use serde::de::Error as SerdeDeError;

use super::errors::ConfigError;
use super::types::PipelineConfig;

/// Load and validate configuration from a TOML file, returning defaults if it is missing.
pub fn load_from(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    let config = parse(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from TOML text without validating it.
pub fn parse(text: &str) -> Result<PipelineConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Write configuration as TOML, creating parent directories as needed.
pub fn save_to(config: &PipelineConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
