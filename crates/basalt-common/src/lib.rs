//! Basalt common — run configuration and logging setup
//!
//! Shared by the binaries, never by the library crates: config is loaded
//! once at startup and the tracing subscriber is installed exactly once.

pub mod config;
pub mod logging;

pub use config::{Config, LogConfig};
pub use logging::{init_logging, LogFormat};
