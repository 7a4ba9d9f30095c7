//! Basalt checktypes — catalog resolution and local builds
//!
//! A checktype source is either a catalog (an HTTP URL or a JSON file with
//! a `checktypes` array) or a local directory holding the source of one
//! checktype. Directories are compiled and packed into container images;
//! the resulting image carries labels that let later runs skip the build
//! when the source tree has not changed.

pub mod build;
pub mod catalog;
pub mod fetch;
pub mod image;
pub mod manifest;

#[cfg(test)]
pub(crate) mod testutil;

pub use build::CheckSource;
pub use catalog::resolve;
pub use image::CheckImage;
pub use manifest::{Manifest, MANIFEST_FILE};
