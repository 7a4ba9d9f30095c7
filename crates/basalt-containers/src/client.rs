//! Docker Engine API client

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use bollard::image::{BuildImageOptions, ListImagesOptions, TagImageOptions};
use bollard::models::IpamConfig;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::StreamExt;
use tracing::{debug, info};

use basalt_core::{Error, Result};

use crate::runtime::Runtime;

/// Name of the engine's default bridge network.
const BRIDGE_NETWORK: &str = "bridge";

/// Transport-level timeout for engine API calls, in seconds. Image builds
/// stream progress records, so this bounds silence, not total build time.
const CLIENT_TIMEOUT_SECS: u64 = 120;

/// Daemon socket used when `DOCKER_HOST` is unset.
const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// The engine capabilities the checktype builder consumes.
///
/// Image labels double as the build cache's persistence layer, so this stays
/// deliberately small: label lookup plus archive builds. Tests implement it
/// with an in-memory fake.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Labels of the referenced image, merged across matching references.
    ///
    /// Unknown references yield an empty map, not an error.
    async fn image_labels(&self, image: &str) -> Result<HashMap<String, String>>;

    /// Build an image from a tar archive, applying every tag and label.
    /// Returns the engine's build log.
    async fn build_image(
        &self,
        tags: &[String],
        labels: &HashMap<String, String>,
        context: Vec<u8>,
    ) -> Result<String>;
}

/// A long-lived Docker Engine API client.
///
/// One handle is shared across every build and inspect call of a run; calls
/// are not retried, a transport failure surfaces immediately.
pub struct DockerClient {
    docker: Docker,
    runtime: Runtime,
    host: String,
}

impl DockerClient {
    /// Connect to the engine at `DOCKER_HOST` (or the platform default
    /// socket) for the given runtime flavor.
    pub fn new(runtime: Runtime) -> Result<DockerClient> {
        let host = std::env::var("DOCKER_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string());
        let docker = connect(&host)?;
        debug!("connected to container engine at {host} (runtime {runtime})");
        Ok(DockerClient {
            docker,
            runtime,
            host,
        })
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    /// The daemon host as containers must see it.
    ///
    /// Docker Desktop proxies a host-side Unix socket into its Linux VM;
    /// passing the host-side path into a container would dangle, so that
    /// flavor reports the VM-side default socket instead.
    pub fn daemon_host(&self) -> String {
        effective_daemon_host(self.runtime, &self.host)
    }

    /// Hostname containers use to reach the host.
    pub fn host_gateway_hostname(&self) -> &'static str {
        self.runtime.host_strategy().gateway_hostname
    }

    /// Extra-host entry for containers, when the flavor needs one.
    pub fn host_gateway_mapping(&self) -> Option<String> {
        self.runtime.host_strategy().host_gateway_mapping()
    }

    /// Address of the host-side interface reachable from containers.
    ///
    /// Plain dockerd exposes the bridge gateway; desktop flavors run the
    /// engine in a VM and publish ports on loopback.
    pub async fn host_gateway_interface_addr(&self) -> Result<String> {
        if self.runtime.host_strategy().loopback_interface {
            return Ok("127.0.0.1".to_string());
        }
        let gateway = self.bridge_gateway().await?;
        Ok(gateway.to_string())
    }

    /// Gateway of the default bridge network. Exactly one is expected.
    pub async fn bridge_gateway(&self) -> Result<IpAddr> {
        let gateways = self.network_gateways(BRIDGE_NETWORK).await?;
        if gateways.len() != 1 {
            return Err(Error::Gateway {
                network: BRIDGE_NETWORK.to_string(),
                reason: format!("unexpected number of gateways: {}", gateways.len()),
            });
        }
        Ok(gateways[0])
    }

    /// All gateways of a network, each validated against its subnet.
    async fn network_gateways(&self, name: &str) -> Result<Vec<IpAddr>> {
        let network = self
            .docker
            .inspect_network::<String>(name, None)
            .await
            .map_err(|e| engine_err("inspect network", e))?;
        let configs = network
            .ipam
            .and_then(|ipam| ipam.config)
            .unwrap_or_default();
        collect_gateways(name, configs)
    }
}

#[async_trait]
impl ContainerEngine for DockerClient {
    async fn image_labels(&self, image: &str) -> Result<HashMap<String, String>> {
        let options = ListImagesOptions {
            all: true,
            filters: HashMap::from([("reference".to_string(), vec![image.to_string()])]),
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_images(Some(options))
            .await
            .map_err(|e| engine_err("list images", e))?;
        let mut labels = HashMap::new();
        for summary in summaries {
            labels.extend(summary.labels);
        }
        Ok(labels)
    }

    async fn build_image(
        &self,
        tags: &[String],
        labels: &HashMap<String, String>,
        context: Vec<u8>,
    ) -> Result<String> {
        let Some((tag, extra_tags)) = tags.split_first() else {
            return Err(Error::Engine {
                op: "build image".to_string(),
                reason: "no tags given".to_string(),
            });
        };

        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: tag.clone(),
            labels: labels.clone(),
            rm: true,
            ..Default::default()
        };

        info!("building image {tag}");
        let mut stream = self.docker.build_image(options, None, Some(context.into()));
        let mut log = String::new();
        while let Some(record) = stream.next().await {
            let record = record.map_err(|e| engine_err("build image", e))?;
            if let Some(detail) = record.error_detail {
                return Err(Error::BuildFailed {
                    image: tag.clone(),
                    reason: detail
                        .message
                        .unwrap_or_else(|| "unknown build error".to_string()),
                });
            }
            if let Some(message) = record.error {
                return Err(Error::BuildFailed {
                    image: tag.clone(),
                    reason: message,
                });
            }
            if let Some(fragment) = record.stream {
                log.push_str(&fragment);
            }
            // Status and aux records carry nothing we keep; end of stream
            // just terminates collection.
        }

        for extra in extra_tags {
            let (repo, tag_part) = extra
                .rsplit_once(':')
                .unwrap_or((extra.as_str(), "latest"));
            self.docker
                .tag_image(
                    tag,
                    Some(TagImageOptions {
                        repo: repo.to_string(),
                        tag: tag_part.to_string(),
                    }),
                )
                .await
                .map_err(|e| engine_err("tag image", e))?;
        }

        debug!("built image {tag}, build log {} bytes", log.len());
        Ok(log)
    }
}

fn engine_err(op: &str, err: bollard::errors::Error) -> Error {
    Error::Engine {
        op: op.to_string(),
        reason: err.to_string(),
    }
}

fn connect(host: &str) -> Result<Docker> {
    let connected = if host.starts_with("unix://") || host.starts_with("npipe://") {
        Docker::connect_with_socket(host, CLIENT_TIMEOUT_SECS, API_DEFAULT_VERSION)
    } else if host.starts_with("tcp://") || host.starts_with("http://") || host.starts_with("https://")
    {
        let http_host = host.replacen("tcp://", "http://", 1);
        Docker::connect_with_http(&http_host, CLIENT_TIMEOUT_SECS, API_DEFAULT_VERSION)
    } else {
        return Err(Error::Engine {
            op: "connect".to_string(),
            reason: format!("unsupported daemon host {host:?}"),
        });
    };
    connected.map_err(|e| engine_err("connect", e))
}

fn effective_daemon_host(runtime: Runtime, host: &str) -> String {
    if runtime == Runtime::DockerdDockerDesktop && host.starts_with("unix://") {
        return DEFAULT_DOCKER_HOST.to_string();
    }
    host.to_string()
}

fn collect_gateways(network: &str, configs: Vec<IpamConfig>) -> Result<Vec<IpAddr>> {
    let mut gateways = Vec::with_capacity(configs.len());
    for cfg in configs {
        let subnet = cfg.subnet.unwrap_or_default();
        let gateway = cfg.gateway.unwrap_or_default();
        let (net, prefix) = parse_cidr(&subnet).map_err(|reason| Error::Gateway {
            network: network.to_string(),
            reason,
        })?;
        let ip: IpAddr = gateway.parse().map_err(|_| Error::Gateway {
            network: network.to_string(),
            reason: format!("invalid gateway {gateway:?}"),
        })?;
        if !cidr_contains(net, prefix, ip) {
            return Err(Error::Gateway {
                network: network.to_string(),
                reason: format!("gateway {gateway} outside subnet {subnet}"),
            });
        }
        gateways.push(ip);
    }
    Ok(gateways)
}

fn parse_cidr(s: &str) -> std::result::Result<(IpAddr, u8), String> {
    let (addr, prefix) = s.split_once('/').ok_or_else(|| format!("invalid subnet {s:?}"))?;
    let addr: IpAddr = addr
        .parse()
        .map_err(|_| format!("invalid subnet {s:?}"))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| format!("invalid subnet {s:?}"))?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(format!("invalid subnet {s:?}"));
    }
    Ok((addr, prefix))
}

fn cidr_contains(net: IpAddr, prefix: u8, ip: IpAddr) -> bool {
    match (net, ip) {
        (IpAddr::V4(net), IpAddr::V4(ip)) => {
            let mask = if prefix == 0 {
                0
            } else {
                u32::MAX << (32 - u32::from(prefix))
            };
            u32::from(net) & mask == u32::from(ip) & mask
        }
        (IpAddr::V6(net), IpAddr::V6(ip)) => {
            let mask = if prefix == 0 {
                0
            } else {
                u128::MAX << (128 - u32::from(prefix))
            };
            u128::from(net) & mask == u128::from(ip) & mask
        }
        _ => false,
    }
}
