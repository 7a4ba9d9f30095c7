//! Checktype descriptors and the name-keyed catalog

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::asset::AssetType;

/// A containerized vulnerability check, resolved either from a remote
/// catalog or from a local source build.
///
/// Immutable once resolved; `name` is the catalog key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checktype {
    /// Unique name within a catalog.
    pub name: String,

    /// Human description of what the check does.
    #[serde(default)]
    pub description: String,

    /// Container image that runs the check.
    pub image: String,

    /// Declared timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Default option set; targets may override keys individually.
    #[serde(default)]
    pub options: Map<String, Value>,

    /// Declared required environment variable names.
    ///
    /// Remote catalogs are arbitrary JSON, so entries stay heterogeneous
    /// here; job generation rejects any non-string entry.
    #[serde(default)]
    pub required_vars: Vec<Value>,

    /// Accepted asset type wire names.
    #[serde(default)]
    pub assets: Vec<String>,
}

impl Checktype {
    /// Whether this checktype accepts targets of the given asset type.
    pub fn accepts(&self, asset_type: AssetType) -> bool {
        self.assets.iter().any(|a| a == asset_type.as_str())
    }
}

/// Checktypes resolved from every configured source, keyed by name.
pub type Catalog = HashMap<String, Checktype>;
