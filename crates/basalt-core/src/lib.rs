//! Basalt core — shared types for the scan planner
//!
//! This crate holds the types every other basalt crate speaks:
//! - `AssetType`: the fixed enumeration of scannable asset kinds
//! - `Target`: what to scan, with per-target option overrides
//! - `Checktype` / `Catalog`: resolved check descriptors keyed by name
//! - `Report` / `Vulnerability`: parsed results streamed back by the engine
//! - `Error` / `Result`: the workspace-wide error enum

pub mod asset;
pub mod checktype;
pub mod error;
pub mod report;
pub mod target;

// Re-export commonly used types at crate root
pub use asset::AssetType;
pub use checktype::{Catalog, Checktype};
pub use error::{Error, Result};
pub use report::{Report, Severity, Vulnerability};
pub use target::Target;
