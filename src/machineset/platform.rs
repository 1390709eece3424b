//! Infrastructure platform names used as the failure-domain discriminator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform a cluster runs on.
///
/// The serialized form is the exact discriminator string. The empty string
/// is [`PlatformType::Unset`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum PlatformType {
    /// No platform, failure domains are not configured
    #[default]
    #[serde(rename = "")]
    Unset,
    /// Amazon Web Services
    #[serde(rename = "AWS")]
    Aws,
    /// Microsoft Azure
    Azure,
    /// Bare metal hosts
    BareMetal,
    /// Google Cloud Platform
    #[serde(rename = "GCP")]
    Gcp,
    /// libvirt
    Libvirt,
    /// OpenStack
    OpenStack,
    /// No infrastructure provider
    None,
    /// VMware vSphere
    VSphere,
    /// oVirt
    #[serde(rename = "oVirt")]
    Ovirt,
    /// IBM Cloud
    #[serde(rename = "IBMCloud")]
    IbmCloud,
    /// KubeVirt
    KubeVirt,
    /// Equinix Metal
    EquinixMetal,
    /// IBM Power Virtual Server
    #[serde(rename = "PowerVS")]
    PowerVs,
    /// Alibaba Cloud
    AlibabaCloud,
    /// Nutanix
    Nutanix,
    /// Externally managed
    External,
}

impl PlatformType {
    /// Every platform, in the order the discriminator enum lists them.
    pub const ALL: [PlatformType; 17] = [
        Self::Unset,
        Self::Aws,
        Self::Azure,
        Self::BareMetal,
        Self::Gcp,
        Self::Libvirt,
        Self::OpenStack,
        Self::None,
        Self::VSphere,
        Self::Ovirt,
        Self::IbmCloud,
        Self::KubeVirt,
        Self::EquinixMetal,
        Self::PowerVs,
        Self::AlibabaCloud,
        Self::Nutanix,
        Self::External,
    ];

    /// Discriminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Aws => "AWS",
            Self::Azure => "Azure",
            Self::BareMetal => "BareMetal",
            Self::Gcp => "GCP",
            Self::Libvirt => "Libvirt",
            Self::OpenStack => "OpenStack",
            Self::None => "None",
            Self::VSphere => "VSphere",
            Self::Ovirt => "oVirt",
            Self::IbmCloud => "IBMCloud",
            Self::KubeVirt => "KubeVirt",
            Self::EquinixMetal => "EquinixMetal",
            Self::PowerVs => "PowerVS",
            Self::AlibabaCloud => "AlibabaCloud",
            Self::Nutanix => "Nutanix",
            Self::External => "External",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a string that names no platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}'")]
pub struct UnknownPlatform(pub String);

impl FromStr for PlatformType {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}
