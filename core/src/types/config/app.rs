use crate::types::UrlMapper;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// User-facing configuration, persisted as proclab.toml.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl AppConfig {
    /// Returns the config file path within the given directory.
    pub fn path(dir: &Path) -> PathBuf {
        dir.join("proclab.toml")
    }

    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, AppConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), AppConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.storage.shared_root.as_os_str().is_empty() {
            errors.push("storage.shared_root must not be empty".to_string());
        }

        if self.links.local_base.is_some() != self.links.remote_base.is_some() {
            errors.push("links.local_base and links.remote_base must be set together".to_string());
        }
        if is_blank(&self.links.local_base) || is_blank(&self.links.remote_base) {
            errors.push("links.local_base and links.remote_base must not be empty".to_string());
        }

        if self.refresh.interval_secs == 0 {
            errors.push("refresh.interval_secs must be at least 1".to_string());
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = Self::default();
        let links_complete = self.links.local_base.is_some() == self.links.remote_base.is_some()
            && !is_blank(&self.links.local_base)
            && !is_blank(&self.links.remote_base);
        Self {
            storage: StorageConfig {
                shared_root: if self.storage.shared_root.as_os_str().is_empty() {
                    defaults.storage.shared_root
                } else {
                    self.storage.shared_root.clone()
                },
                backend: self.storage.backend,
            },
            links: if links_complete {
                self.links.clone()
            } else {
                defaults.links
            },
            refresh: RefreshConfig {
                interval_secs: if self.refresh.interval_secs == 0 {
                    defaults.refresh.interval_secs
                } else {
                    self.refresh.interval_secs
                },
            },
        }
    }
}

/// Where records live.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_shared_root")]
    pub shared_root: PathBuf,
    #[serde(default)]
    pub backend: Backend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            shared_root: default_shared_root(),
            backend: Backend::default(),
        }
    }
}

/// Storage backend selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Flat JSON files in the shared folder.
    #[default]
    Json,
    /// Embedded redb database in the shared folder.
    Db,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Json => write!(f, "json"),
            Backend::Db => write!(f, "db"),
        }
    }
}

/// Local-path to remote-URL mapping for uploaded files.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_base: Option<String>,
}

impl LinksConfig {
    /// The configured mapper, if both ends are set and non-blank.
    pub fn mapper(&self) -> Option<UrlMapper> {
        match (&self.local_base, &self.remote_base) {
            (Some(local), Some(remote)) if !local.trim().is_empty() && !remote.trim().is_empty() => {
                Some(UrlMapper::new(local.clone(), remote.clone()))
            }
            _ => None,
        }
    }
}

/// Auto-refresh settings for watching a test.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|value| value.trim().is_empty())
}

fn default_shared_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_interval_secs() -> u64 {
    5
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
