//! Units catalog and data-source configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use storage::{FileSource, HttpSource, QuestionSource};
use url::Url;

use quiz_core::model::{SourceId, UnitName};

use crate::error::ConfigError;

/// Session length used when none (or an invalid one) is requested.
pub const DEFAULT_COUNT: usize = 25;

/// One selectable unit and the source holding its questions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitEntry {
    pub name: UnitName,
    pub source: SourceId,
}

impl UnitEntry {
    #[must_use]
    pub fn new(name: UnitName, source: SourceId) -> Self {
        Self { name, source }
    }
}

/// Catalog of units plus where their data lives.
///
/// ```toml
/// data_root = "data"
/// chains = "chains.jsonl"
///
/// [[units]]
/// name = "Heart"
/// source = "heart.jsonl"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_data_root")]
    pub data_root: String,
    #[serde(default = "default_count")]
    pub default_count: usize,
    #[serde(default)]
    pub chains: Option<SourceId>,
    #[serde(default)]
    pub units: Vec<UnitEntry>,
}

fn default_data_root() -> String {
    "data".into()
}

fn default_count() -> usize {
    DEFAULT_COUNT
}

impl QuizConfig {
    /// Build a validated config from catalog entries.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the catalog is empty or names a unit twice.
    pub fn new(
        data_root: impl Into<String>,
        units: Vec<UnitEntry>,
        chains: Option<SourceId>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            data_root: data_root.into(),
            default_count: DEFAULT_COUNT,
            chains,
            units,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML catalog.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid TOML and validation errors otherwise.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a catalog file. A relative local `data_root` is resolved against
    /// the catalog's directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;

        if !is_url(&config.data_root) && Path::new(&config.data_root).is_relative() {
            if let Some(parent) = path.parent() {
                config.data_root = parent.join(&config.data_root).display().to_string();
            }
        }
        Ok(config)
    }

    /// Apply `QUIZ_DATA_ROOT` if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(root) = env::var("QUIZ_DATA_ROOT") {
            if !root.trim().is_empty() {
                self.data_root = root.trim().to_string();
            }
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::NoUnits);
        }
        if self.default_count == 0 {
            return Err(ConfigError::InvalidDefaultCount);
        }
        for (i, entry) in self.units.iter().enumerate() {
            if self.units[..i].iter().any(|other| other.name == entry.name) {
                return Err(ConfigError::DuplicateUnit(entry.name.to_string()));
            }
        }
        Ok(())
    }

    /// Catalog entry for `name`.
    #[must_use]
    pub fn unit(&self, name: &UnitName) -> Option<&UnitEntry> {
        self.units.iter().find(|entry| &entry.name == name)
    }

    /// Source reading from `data_root`: HTTP for `http(s)://` roots, files otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDataRoot` if a URL root cannot be parsed.
    pub fn source(&self) -> Result<Arc<dyn QuestionSource>, ConfigError> {
        if is_url(&self.data_root) {
            let url = Url::parse(&self.data_root).map_err(|e| ConfigError::InvalidDataRoot {
                raw: self.data_root.clone(),
                reason: e.to_string(),
            })?;
            Ok(Arc::new(HttpSource::new(url)))
        } else {
            Ok(Arc::new(FileSource::new(PathBuf::from(&self.data_root))))
        }
    }
}

fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}
