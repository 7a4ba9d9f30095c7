//! Checktype image metadata.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use basalt_core::{Checktype, Error, Result};
use basalt_containers::ContainerEngine;

use crate::manifest::Manifest;

/// Label carrying the source fingerprint of the build.
pub const LAST_MODIFIED_LABEL: &str = "sh.basalt.checktype.last-modified";

/// Label carrying the checktype name.
pub const NAME_LABEL: &str = "sh.basalt.checktype.name";

/// Label carrying the verbatim manifest text.
pub const MANIFEST_LABEL: &str = "sh.basalt.checktype.manifest";

/// Cache record of a previously built checktype image, reconstructed from
/// the labels the build stamped on it.
#[derive(Debug, Clone)]
pub struct CheckImage {
    /// Image reference in `repository:tag` form.
    pub name: String,
    pub checktype_name: String,
    pub manifest: Manifest,
    /// Source fingerprint recorded at build time.
    pub last_modified: DateTime<Utc>,
}

impl CheckImage {
    /// Looks up the cache record for `image`.
    ///
    /// A missing image, a missing label or an unparseable label value all
    /// yield [`Error::NoChecktypeImage`]: either the image carries the full
    /// label set or it is not a checktype image at all, there is no partial
    /// fallback.
    pub async fn inspect<C: ContainerEngine>(engine: &C, image: &str) -> Result<CheckImage> {
        let labels = engine.image_labels(image).await?;

        let fingerprint = label(&labels, image, LAST_MODIFIED_LABEL)?;
        let last_modified = parse_fingerprint(fingerprint)
            .map_err(|reason| no_checktype_image(image, reason))?;
        let checktype_name = label(&labels, image, NAME_LABEL)?;
        let manifest_text = label(&labels, image, MANIFEST_LABEL)?;
        let manifest = Manifest::parse(manifest_text).map_err(|e| {
            no_checktype_image(image, format!("invalid label {MANIFEST_LABEL}: {e}"))
        })?;

        Ok(CheckImage {
            name: image.to_string(),
            checktype_name: checktype_name.clone(),
            manifest,
            last_modified,
        })
    }

    /// Derives the checktype descriptor recorded in this image.
    pub fn checktype(&self) -> Result<Checktype> {
        let options = self.manifest.default_options().map_err(|e| Error::InvalidManifest {
            path: self.name.clone(),
            reason: format!("options: {e}"),
        })?;
        let required_vars = self
            .manifest
            .required_vars
            .iter()
            .cloned()
            .map(Value::String)
            .collect();

        Ok(Checktype {
            name: self.checktype_name.clone(),
            description: self.manifest.description.clone(),
            image: self.name.clone(),
            timeout: self.manifest.timeout,
            options,
            required_vars,
            assets: self.manifest.asset_types.clone(),
        })
    }
}

/// Assembles the label set stamped on a fresh build.
pub fn build_labels(
    checktype_name: &str,
    manifest_text: &str,
    fingerprint: DateTime<Utc>,
) -> HashMap<String, String> {
    HashMap::from([
        (NAME_LABEL.to_string(), checktype_name.to_string()),
        (MANIFEST_LABEL.to_string(), manifest_text.to_string()),
        (LAST_MODIFIED_LABEL.to_string(), encode_fingerprint(fingerprint)),
    ])
}

/// Encodes a source fingerprint the way the label stores it: UTC RFC 3339
/// truncated to whole seconds.
///
/// The encoding is lossy on purpose. Cache validity is exact equality of
/// this text, so two modification times within the same second compare
/// equal; changing the precision would invalidate every label already out
/// there.
pub fn encode_fingerprint(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_fingerprint(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid time {s:?} in label {LAST_MODIFIED_LABEL}: {e}"))
}

fn label<'a>(
    labels: &'a HashMap<String, String>,
    image: &str,
    key: &str,
) -> Result<&'a String> {
    labels
        .get(key)
        .ok_or_else(|| no_checktype_image(image, format!("label {key} not found")))
}

fn no_checktype_image(image: &str, reason: impl Into<String>) -> Error {
    Error::NoChecktypeImage {
        image: image.to_string(),
        reason: reason.into(),
    }
}
