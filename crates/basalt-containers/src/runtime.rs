//! Container runtime flavors

use std::str::FromStr;

use basalt_core::{Error, Result};

/// Environment variable selecting the container runtime flavor.
pub const RUNTIME_ENV: &str = "BASALT_RUNTIME";

/// Supported container runtime flavors.
///
/// All of them speak the Docker Engine API; what differs is how containers
/// reach the host and where the daemon socket really lives. Those
/// differences are captured in one [`HostStrategy`] row per variant instead
/// of branching at every call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Runtime {
    /// Plain Docker daemon.
    #[default]
    Dockerd,

    /// Docker Desktop (the engine runs inside a VM).
    DockerdDockerDesktop,

    /// Rancher Desktop in dockerd mode.
    DockerdRancherDesktop,

    /// Podman Desktop exposing the Docker-compatible socket.
    DockerdPodmanDesktop,
}

/// Per-flavor host-reachability strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostStrategy {
    /// Hostname containers use to reach the host.
    pub gateway_hostname: &'static str,

    /// Whether the engine needs an explicit `<hostname>:host-gateway`
    /// extra-host entry. Desktop runtimes resolve the hostname natively.
    pub map_host_gateway: bool,

    /// Whether the host-side interface address falls back to loopback.
    /// True for desktop runtimes, where the engine lives in a VM and
    /// published ports appear on `127.0.0.1`.
    pub loopback_interface: bool,
}

impl HostStrategy {
    /// The extra-host entry to add to containers, if this flavor needs one.
    pub fn host_gateway_mapping(&self) -> Option<String> {
        self.map_host_gateway
            .then(|| format!("{}:host-gateway", self.gateway_hostname))
    }
}

impl Runtime {
    /// Read the runtime from [`RUNTIME_ENV`].
    ///
    /// Unset or empty selects [`Runtime::Dockerd`]; an unknown value is an
    /// error.
    pub fn from_env() -> Result<Runtime> {
        match std::env::var(RUNTIME_ENV) {
            Ok(value) if value.is_empty() => Ok(Runtime::default()),
            Ok(value) => value.parse(),
            Err(std::env::VarError::NotPresent) => Ok(Runtime::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(Error::InvalidRuntime(format!(
                "{RUNTIME_ENV} is not valid unicode"
            ))),
        }
    }

    /// The strategy table row for this flavor.
    pub const fn host_strategy(self) -> HostStrategy {
        match self {
            Runtime::Dockerd => HostStrategy {
                gateway_hostname: "host.docker.internal",
                map_host_gateway: true,
                loopback_interface: false,
            },
            Runtime::DockerdDockerDesktop | Runtime::DockerdRancherDesktop => HostStrategy {
                gateway_hostname: "host.docker.internal",
                map_host_gateway: false,
                loopback_interface: true,
            },
            Runtime::DockerdPodmanDesktop => HostStrategy {
                gateway_hostname: "host.containers.internal",
                map_host_gateway: false,
                loopback_interface: true,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Dockerd => "Dockerd",
            Runtime::DockerdDockerDesktop => "DockerdDockerDesktop",
            Runtime::DockerdRancherDesktop => "DockerdRancherDesktop",
            Runtime::DockerdPodmanDesktop => "DockerdPodmanDesktop",
        }
    }
}

impl FromStr for Runtime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Runtime> {
        match s.to_lowercase().as_str() {
            "dockerd" => Ok(Runtime::Dockerd),
            "dockerddockerdesktop" => Ok(Runtime::DockerdDockerDesktop),
            "dockerdrancherdesktop" => Ok(Runtime::DockerdRancherDesktop),
            "dockerdpodmandesktop" => Ok(Runtime::DockerdPodmanDesktop),
            _ => Err(Error::InvalidRuntime(s.to_string())),
        }
    }
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
