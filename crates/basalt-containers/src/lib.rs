//! Basalt containers — Docker Engine API access
//!
//! Wraps bollard behind the small [`ContainerEngine`] capability trait the
//! checktype builder consumes (label lookup, archive builds) and adds the
//! runtime-flavor handling: which hostname reaches the host from inside a
//! container, whether an extra-host mapping is needed, and where the daemon
//! socket really lives per flavor.

pub mod client;
pub mod runtime;

pub use client::{ContainerEngine, DockerClient};
pub use runtime::{HostStrategy, Runtime, RUNTIME_ENV};
