//! Scan target definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Something to scan: a domain, host, URL, repository, etc.
///
/// The asset type is carried as a plain string so that configuration
/// decoding never rejects a target; validation against the fixed
/// [`AssetType`](crate::AssetType) enumeration happens at check-generation
/// time, where an empty or unknown tag is a hard error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// What to scan.
    pub identifier: String,

    /// Asset type wire name (e.g. `DomainName`).
    #[serde(default)]
    pub asset_type: String,

    /// Per-target option overrides, merged over checktype defaults key by
    /// key.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Target {
    /// Create a target with no option overrides.
    pub fn new(identifier: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Target {
            identifier: identifier.into(),
            asset_type: asset_type.into(),
            options: Map::new(),
        }
    }

    /// Add a single option override.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The natural deduplication key: `(identifier, asset_type)`.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.identifier, &self.asset_type)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.identifier, self.asset_type)
    }
}
