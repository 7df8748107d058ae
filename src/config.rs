//! Hub configuration.
//!
//! Configuration is TOML. A default copy is embedded in the binary
//! (`hub.toml`) and parsed once; user files only need the keys they change.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

const EMBEDDED: &str = include_str!("hub.toml");

static EMBEDDED_CONFIG: Lazy<HubConfig> = Lazy::new(|| match toml::from_str(EMBEDDED) {
    Ok(config) => config,
    Err(err) => {
        tracing::warn!(error = %err, "embedded hub.toml is invalid, using built-in defaults");
        HubConfig {
            hub: HubSettings::default(),
            log: LogSettings::default(),
            routes: RouteSettings::default(),
        }
    }
});

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub routes: RouteSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Include pretty-printed message bodies in rejection warnings.
    pub dump_messages: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            dump_messages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub ansi: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// `[from, to]` application pairs the directory refuses to resolve.
    pub blocked: Vec<[String; 2]>,
}

impl Default for HubConfig {
    fn default() -> Self {
        EMBEDDED_CONFIG.clone()
    }
}

impl HubConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, otherwise the embedded defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
