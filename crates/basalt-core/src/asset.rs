//! Asset type definitions

use serde::{Deserialize, Serialize};

/// The kinds of assets a checktype can run against.
///
/// The wire names (`IP`, `DomainName`, ...) are the ones catalogs and run
/// configurations use; they are fixed and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    #[serde(rename = "IP")]
    Ip,

    #[serde(rename = "IPRange")]
    IpRange,

    DomainName,

    Hostname,

    WebAddress,

    GitRepository,

    DockerImage,

    #[serde(rename = "AWSAccount")]
    AwsAccount,

    #[serde(rename = "GCPProject")]
    GcpProject,

    KubernetesCluster,
}

impl AssetType {
    /// Every supported asset type.
    pub const ALL: [AssetType; 10] = [
        AssetType::Ip,
        AssetType::IpRange,
        AssetType::DomainName,
        AssetType::Hostname,
        AssetType::WebAddress,
        AssetType::GitRepository,
        AssetType::DockerImage,
        AssetType::AwsAccount,
        AssetType::GcpProject,
        AssetType::KubernetesCluster,
    ];

    /// Parse a wire name into an asset type.
    ///
    /// Returns `None` for anything outside the fixed enumeration; callers
    /// decide how to report that (targets carry their own context).
    pub fn parse(s: &str) -> Option<AssetType> {
        match s {
            "IP" => Some(AssetType::Ip),
            "IPRange" => Some(AssetType::IpRange),
            "DomainName" => Some(AssetType::DomainName),
            "Hostname" => Some(AssetType::Hostname),
            "WebAddress" => Some(AssetType::WebAddress),
            "GitRepository" => Some(AssetType::GitRepository),
            "DockerImage" => Some(AssetType::DockerImage),
            "AWSAccount" => Some(AssetType::AwsAccount),
            "GCPProject" => Some(AssetType::GcpProject),
            "KubernetesCluster" => Some(AssetType::KubernetesCluster),
            _ => None,
        }
    }

    /// The wire name of this asset type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Ip => "IP",
            AssetType::IpRange => "IPRange",
            AssetType::DomainName => "DomainName",
            AssetType::Hostname => "Hostname",
            AssetType::WebAddress => "WebAddress",
            AssetType::GitRepository => "GitRepository",
            AssetType::DockerImage => "DockerImage",
            AssetType::AwsAccount => "AWSAccount",
            AssetType::GcpProject => "GCPProject",
            AssetType::KubernetesCluster => "KubernetesCluster",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
