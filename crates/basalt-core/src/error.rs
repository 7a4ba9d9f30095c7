//! Error types shared across the basalt workspace

use thiserror::Error;

/// Result type alias using the basalt [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while resolving checktypes, generating jobs and
/// collecting reports
#[derive(Error, Debug)]
pub enum Error {
    // === Catalog Errors ===
    #[error("missing checktype catalogs")]
    MissingCatalogs,

    #[error("invalid checktype source {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("fetch checktype source {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("malformed checktype catalog {url}: {reason}")]
    MalformedCatalog { url: String, reason: String },

    // === Target Errors ===
    #[error("target {identifier} has no asset type")]
    MissingAssetType { identifier: String },

    #[error("invalid asset type {asset_type} for target {identifier}")]
    InvalidAssetType {
        identifier: String,
        asset_type: String,
    },

    // === Build Errors ===
    #[error("checktype directory {dir} is empty")]
    EmptyCheckDir { dir: String },

    #[error("no manifest file found in {dir}")]
    MissingManifest { dir: String },

    #[error("invalid manifest {path}: {reason}")]
    InvalidManifest { path: String, reason: String },

    #[error("{image} is not a checktype image: {reason}")]
    NoChecktypeImage { image: String, reason: String },

    #[error("compile checktype source in {dir}: {reason}")]
    Compile { dir: String, reason: String },

    #[error("archive checktype source in {dir}: {reason}")]
    Archive { dir: String, reason: String },

    #[error("build image {image}: {reason}")]
    BuildFailed { image: String, reason: String },

    // === Job Generation Errors ===
    #[error("checktype {checktype} declares non-string required vars")]
    RequiredVars { checktype: String },

    // === Report Store Errors ===
    #[error("unknown data kind: {0}")]
    UnknownDataKind(String),

    #[error("malformed report for check {check_id}: {reason}")]
    MalformedReport { check_id: String, reason: String },

    // === Container Engine Errors ===
    #[error("container engine: {op}: {reason}")]
    Engine { op: String, reason: String },

    #[error("network {network}: {reason}")]
    Gateway { network: String, reason: String },

    #[error("invalid runtime: {0}")]
    InvalidRuntime(String),

    // === Configuration Errors ===
    #[error("configuration error: {0}")]
    Configuration(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when a cache lookup found no valid previously built image.
    ///
    /// The builder treats this as "never built" and rebuilds instead of
    /// failing.
    pub fn is_no_checktype_image(&self) -> bool {
        matches!(self, Error::NoChecktypeImage { .. })
    }

    /// True for errors caused by the run configuration or its inputs
    /// rather than by the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::MissingCatalogs
                | Error::InvalidUrl { .. }
                | Error::MissingAssetType { .. }
                | Error::InvalidAssetType { .. }
                | Error::RequiredVars { .. }
                | Error::InvalidRuntime(_)
                | Error::Configuration(_)
        )
    }
}
