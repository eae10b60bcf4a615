//! Configuration loading from disk.
//!
//! Two inputs are loaded here: the resource file that backs every
//! snapshot, and the optional TOML settings file for the server itself.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Resource table as it comes out of the deserializer, before the default
/// subject is extracted. `None` attribute values come from YAML nulls.
pub type RawResources = HashMap<String, BTreeMap<String, Option<String>>>;

/// Error type for loading the resource source.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("resource source {origin} could not be read: {source}")]
    NotFound {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("resource source {origin} is malformed: {reason}")]
    Malformed { origin: String, reason: String },
}

/// Where snapshots come from.
pub trait ResourceSource: Send + Sync {
    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;

    /// Read and deserialize the whole source.
    fn fetch(&self) -> Result<RawResources, ConfigError>;
}

/// On-disk syntax of a resource file, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Toml,
    Json,
}

impl SourceFormat {
    /// Unknown or missing extensions are read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => SourceFormat::Toml,
            Some("json") => SourceFormat::Json,
            _ => SourceFormat::Yaml,
        }
    }

    fn parse(self, content: &str) -> Result<RawResources, String> {
        match self {
            SourceFormat::Yaml => serde_saphyr::from_str(content).map_err(|e| e.to_string()),
            SourceFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            SourceFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// A resource file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: SourceFormat,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SourceFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }
}

impl ResourceSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<RawResources, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::NotFound {
            origin: self.describe(),
            source,
        })?;

        // A file caught mid-write reads as empty; never accept it as "no users".
        if content.trim().is_empty() {
            return Err(ConfigError::Malformed {
                origin: self.describe(),
                reason: "file is empty".to_string(),
            });
        }

        self.format
            .parse(&content)
            .map_err(|reason| ConfigError::Malformed {
                origin: self.describe(),
                reason,
            })
    }
}

/// A fixed in-memory table. Reloading it always yields the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    raw: RawResources,
}

impl StaticSource {
    pub fn new(raw: RawResources) -> Self {
        Self { raw }
    }
}

impl ResourceSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    fn fetch(&self) -> Result<RawResources, ConfigError> {
        Ok(self.raw.clone())
    }
}

/// Error type for loading server settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load server settings from a TOML file. Validation is left to the caller
/// so CLI overrides can be applied first.
pub fn load_settings(path: &Path) -> Result<ServerConfig, SettingsError> {
    let content = fs::read_to_string(path).map_err(SettingsError::Io)?;
    toml::from_str(&content).map_err(SettingsError::Parse)
}

/// Validate settings after all overrides have been applied.
pub fn finalize_settings(config: ServerConfig) -> Result<ServerConfig, SettingsError> {
    validate_config(&config).map_err(SettingsError::Validation)?;
    Ok(config)
}
