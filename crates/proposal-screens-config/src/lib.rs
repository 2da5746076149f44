use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {config_path}: {source}")]
    ConfigWriteError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one sub-directory per screen.
    pub screens_path: PathBuf,
    /// Decompose whole lists as single fields.
    #[serde(default)]
    pub collapse_lists: bool,
    /// Page size for print composition when no screen declares one,
    /// as CSS lengths such as `210mm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_page_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_page_height: Option<String>,
}

impl Config {
    pub fn new(screens_path: impl Into<PathBuf>) -> Self {
        Self {
            screens_path: screens_path.into(),
            collapse_lists: false,
            default_page_width: None,
            default_page_height: None,
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.screens_path =
            Self::expand_path(&config.screens_path).unwrap_or(config.screens_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> Result<(), ConfigError> {
        let config_path = config_path.as_ref();
        let write_error = |source| ConfigError::ConfigWriteError {
            config_path: config_path.to_path_buf(),
            source,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content).map_err(write_error)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/proposal-screens");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Both default page dimensions, when both are configured.
    pub fn default_page_size(&self) -> Option<(&str, &str)> {
        Some((
            self.default_page_width.as_deref()?,
            self.default_page_height.as_deref()?,
        ))
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        shellexpand::full(&path_str)
            .ok()
            .map(|expanded| PathBuf::from(expanded.as_ref()))
    }
}
