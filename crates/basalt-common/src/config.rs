//! Run configuration for basalt

use std::path::Path;

use serde::{Deserialize, Serialize};

use basalt_core::{Error, Result, Target};

/// A basalt run described in TOML (default file `basalt.toml`).
///
/// ```toml
/// checktypes = [
///     "https://catalogs.example.com/web.json",
///     "./checktypes/headercheck",
/// ]
///
/// [[targets]]
/// identifier = "example.com"
/// asset_type = "DomainName"
///
/// [targets.options]
/// depth = 2
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ordered checktype sources; later sources win on name collision.
    #[serde(default)]
    pub checktypes: Vec<String>,

    /// Targets to plan checks for.
    #[serde(default)]
    pub targets: Vec<Target>,

    /// Container runtime flavor name (e.g. `Dockerd`).
    pub runtime: Option<String>,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Configuration(format!("parse config: {e}")))
    }

    /// Merge with environment variables (`BASALT_` prefix).
    pub fn merge_env(mut self) -> Self {
        if let Ok(val) = std::env::var("BASALT_RUNTIME") {
            if !val.is_empty() {
                self.runtime = Some(val);
            }
        }
        if let Ok(val) = std::env::var("BASALT_LOG_LEVEL") {
            self.log.level = val;
        }
        if let Ok(val) = std::env::var("BASALT_LOG_FORMAT") {
            self.log.format = val;
        }
        self
    }

    /// A run needs at least one checktype source and one target.
    pub fn validate(&self) -> Result<()> {
        if self.checktypes.is_empty() {
            return Err(Error::MissingCatalogs);
        }
        if self.targets.is_empty() {
            return Err(Error::Configuration("no targets defined".to_string()));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
