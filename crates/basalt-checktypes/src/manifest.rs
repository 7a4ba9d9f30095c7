//! Checktype manifests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use basalt_core::{Error, Result};

/// Name of the manifest file at the root of a checktype source directory.
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Document every checktype source directory carries at its root.
///
/// Default options are declared as a JSON object inside a string, so the
/// manifest and remote catalog payloads share one encoding for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub description: String,
    pub timeout: Option<u64>,
    /// JSON object with the checktype's default options.
    pub options: Option<String>,
    pub required_vars: Vec<String>,
    pub asset_types: Vec<String>,
}

impl Manifest {
    /// Parses manifest text.
    pub fn parse(content: &str) -> std::result::Result<Manifest, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads and parses the manifest of a checktype source directory.
    ///
    /// Returns the parsed manifest together with its verbatim text, which
    /// is what gets recorded as an image label.
    pub fn from_dir(dir: &Path) -> Result<(Manifest, String)> {
        let path = dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingManifest {
                    dir: dir.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let manifest = Manifest::parse(&content).map_err(|e| Error::InvalidManifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok((manifest, content))
    }

    /// Decodes the declared default options into an option map.
    pub fn default_options(&self) -> std::result::Result<Map<String, Value>, serde_json::Error> {
        match self.options.as_deref() {
            None | Some("") => Ok(Map::new()),
            Some(text) => serde_json::from_str(text),
        }
    }
}
