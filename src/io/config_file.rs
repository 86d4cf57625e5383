//! Read/write configuration JSON files.
//!
//! A configuration file is either a bare object of parameters or the envelope
//! this module writes:
//!
//! ```json
//! { "_metadata": { ... }, "config": { "primer_opt_size": 20, ... } }
//! ```
//!
//! The documented template additionally carries `_parameter_info` with the
//! bounds and description of every field. Keys starting with `_` are ignored
//! on load.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigBundle, FIELD_SPECS, FieldCategory};
use crate::error::ConfigFileError;

pub const CONFIG_FILE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
pub struct ConfigMetadata {
    pub description: &'static str,
    pub version: &'static str,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ConfigMetadata {
    fn now() -> Self {
        Self {
            description: "Primer design configuration",
            version: CONFIG_FILE_VERSION,
            created_by: format!("primer-designer {}", env!("CARGO_PKG_VERSION")),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    pub description: &'static str,
    pub category: FieldCategory,
    pub min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct ConfigFile<'a> {
    #[serde(rename = "_metadata")]
    metadata: ConfigMetadata,
    config: &'a ConfigBundle,
    #[serde(rename = "_parameter_info", skip_serializing_if = "Option::is_none")]
    parameter_info: Option<BTreeMap<&'static str, ParameterInfo>>,
}

pub fn parameter_info() -> BTreeMap<&'static str, ParameterInfo> {
    FIELD_SPECS
        .iter()
        .map(|s| {
            (
                s.name,
                ParameterInfo {
                    description: s.description,
                    category: s.category,
                    min: s.min,
                    max: s.max,
                    unit: s.unit,
                },
            )
        })
        .collect()
}

/// Render a bundle as configuration-file JSON.
pub fn config_to_json(config: &ConfigBundle, documented: bool) -> Result<String, serde_json::Error> {
    let file = ConfigFile {
        metadata: ConfigMetadata::now(),
        config,
        parameter_info: documented.then(parameter_info),
    };
    serde_json::to_string_pretty(&file)
}

/// Write a configuration file, creating parent directories.
pub fn save_config_file(
    config: &ConfigBundle,
    path: &Path,
    documented: bool,
) -> Result<(), ConfigFileError> {
    let io_err = |source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let json = config_to_json(config, documented).map_err(|source| ConfigFileError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    w.write_all(json.as_bytes()).map_err(io_err)?;
    w.write_all(b"\n").map_err(io_err)?;
    w.flush().map_err(io_err)?;

    info!(path = %path.display(), documented, "configuration written");
    Ok(())
}

/// Load and validate a configuration file.
pub fn load_config_file(path: &Path) -> Result<ConfigBundle, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ConfigFileError::NotAFile(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
            ConfigFileError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })?;

    let body = match value {
        serde_json::Value::Object(mut map) if map.contains_key("config") => {
            map.remove("config").unwrap_or_default()
        }
        other => other,
    };
    let body = match body {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter().filter(|(k, _)| !k.starts_with('_')).collect(),
        ),
        other => other,
    };

    let config = ConfigBundle::from_json_value(body).map_err(|source| ConfigFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}
