//! Typed views of an admitted control-plane machine set spec.
//!
//! These types assume their input already passed
//! [`Validator::validate`](crate::core::Validator::validate). They drop
//! unknown fields, which the validator itself preserves.

use crate::error::{AdmissionError, Result};
use crate::machineset::PlatformType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Desired state of the control-plane machine set.
///
/// Example:
/// ```yaml
/// replicas: 3
/// state: Active
/// strategy:
///   type: RollingUpdate
/// selector:
///   matchLabels:
///     machine.openshift.io/cluster-api-machine-role: master
/// template:
///   machineType: machines_v1beta1_machine_openshift_io
///   machines_v1beta1_machine_openshift_io:
///     failureDomains:
///       platform: GCP
///       gcp:
///       - zone: us-central1-a
///     metadata:
///       labels: {}
///     spec: {}
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneMachineSetSpec {
    /// Number of control-plane machines
    pub replicas: i64,

    /// Whether the controller acts on this machine set
    pub state: MachineSetState,

    /// How machines are replaced
    pub strategy: Strategy,

    /// Label selector for owned machines, not interpreted here
    pub selector: Value,

    /// Machine template
    pub template: MachineTemplate,
}

impl ControlPlaneMachineSetSpec {
    /// Convert the output of a successful validation.
    ///
    /// # Errors
    ///
    /// Returns `DeserializationError` when the value does not have the
    /// admitted shape, for instance when it was never validated.
    pub fn from_admitted(admitted: Value) -> Result<Self> {
        serde_json::from_value(admitted).map_err(|e| {
            AdmissionError::DeserializationError(format!(
                "admitted spec does not match the typed view: {e}"
            ))
        })
    }

    /// Failure domains of the OpenShift machine template, if any.
    pub fn failure_domains(&self) -> Option<&FailureDomains> {
        self.template
            .machines_v1beta1_machine_openshift_io
            .as_ref()
            .and_then(|t| t.failure_domains.as_ref())
    }
}

/// Machine set state
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum MachineSetState {
    /// Controller manages machines
    Active,
    /// Controller only observes
    #[default]
    Inactive,
}

/// Replacement strategy
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Strategy {
    /// Strategy type
    #[serde(rename = "type")]
    pub strategy_type: StrategyType,
}

/// Supported replacement strategies
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum StrategyType {
    /// Replace one machine at a time, surging first
    #[default]
    RollingUpdate,
    /// Replace after deletion
    Recreate,
    /// Replace only when a machine is deleted manually
    OnDelete,
}

/// Template union keyed by `machineType`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineTemplate {
    /// Template discriminator
    pub machine_type: String,

    /// OpenShift Machine API v1beta1 template
    #[serde(
        rename = "machines_v1beta1_machine_openshift_io",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub machines_v1beta1_machine_openshift_io: Option<OpenShiftMachineTemplate>,
}

/// Machine API v1beta1 template
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftMachineTemplate {
    /// Where machines may be placed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_domains: Option<FailureDomains>,

    /// Labels and annotations stamped on created machines
    pub metadata: TemplateMetadata,

    /// Provider-specific machine spec, not interpreted here
    pub spec: Value,
}

/// Template object metadata
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TemplateMetadata {
    /// Machine labels
    #[serde(deserialize_with = "string_map")]
    pub labels: BTreeMap<String, String>,

    /// Machine annotations
    #[serde(default, deserialize_with = "string_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Failure domains, one variant per platform with a payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(try_from = "RawFailureDomains", into = "RawFailureDomains")]
pub enum FailureDomains {
    /// `platform` is empty
    #[default]
    Unspecified,
    /// AWS failure domains
    Aws(Vec<AwsFailureDomain>),
    /// Azure failure domains
    Azure(Vec<AzureFailureDomain>),
    /// GCP failure domains
    Gcp(Vec<GcpFailureDomain>),
    /// OpenStack failure domains
    OpenStack(Vec<OpenStackFailureDomain>),
    /// vSphere failure domains
    VSphere(Vec<VSphereFailureDomain>),
    /// Nutanix failure domains
    Nutanix(Vec<NutanixFailureDomainReference>),
    /// A platform without failure-domain configuration
    Other(PlatformType),
}

impl FailureDomains {
    /// Discriminator value.
    pub fn platform(&self) -> PlatformType {
        match self {
            Self::Unspecified => PlatformType::Unset,
            Self::Aws(_) => PlatformType::Aws,
            Self::Azure(_) => PlatformType::Azure,
            Self::Gcp(_) => PlatformType::Gcp,
            Self::OpenStack(_) => PlatformType::OpenStack,
            Self::VSphere(_) => PlatformType::VSphere,
            Self::Nutanix(_) => PlatformType::Nutanix,
            Self::Other(platform) => *platform,
        }
    }

    /// Number of configured failure domains.
    pub fn len(&self) -> usize {
        match self {
            Self::Unspecified | Self::Other(_) => 0,
            Self::Aws(d) => d.len(),
            Self::Azure(d) => d.len(),
            Self::Gcp(d) => d.len(),
            Self::OpenStack(d) => d.len(),
            Self::VSphere(d) => d.len(),
            Self::Nutanix(d) => d.len(),
        }
    }

    /// True when no failure domains are configured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct RawFailureDomains {
    #[serde(default, deserialize_with = "null_as_default")]
    platform: PlatformType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws: Option<Vec<AwsFailureDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azure: Option<Vec<AzureFailureDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcp: Option<Vec<GcpFailureDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    openstack: Option<Vec<OpenStackFailureDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vsphere: Option<Vec<VSphereFailureDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nutanix: Option<Vec<NutanixFailureDomainReference>>,
}

impl TryFrom<RawFailureDomains> for FailureDomains {
    type Error = String;

    fn try_from(raw: RawFailureDomains) -> std::result::Result<Self, Self::Error> {
        fn payload<T>(platform: PlatformType, field: &str, value: Option<T>) -> std::result::Result<T, String> {
            value.ok_or_else(|| format!("{field} configuration is required when platform is {platform}"))
        }

        Ok(match raw.platform {
            PlatformType::Unset => Self::Unspecified,
            p @ PlatformType::Aws => Self::Aws(payload(p, "aws", raw.aws)?),
            p @ PlatformType::Azure => Self::Azure(payload(p, "azure", raw.azure)?),
            p @ PlatformType::Gcp => Self::Gcp(payload(p, "gcp", raw.gcp)?),
            p @ PlatformType::OpenStack => Self::OpenStack(payload(p, "openstack", raw.openstack)?),
            p @ PlatformType::VSphere => Self::VSphere(payload(p, "vsphere", raw.vsphere)?),
            p @ PlatformType::Nutanix => Self::Nutanix(payload(p, "nutanix", raw.nutanix)?),
            other => Self::Other(other),
        })
    }
}

impl From<FailureDomains> for RawFailureDomains {
    fn from(domains: FailureDomains) -> Self {
        let mut raw = RawFailureDomains {
            platform: domains.platform(),
            ..Default::default()
        };
        match domains {
            FailureDomains::Unspecified | FailureDomains::Other(_) => {}
            FailureDomains::Aws(d) => raw.aws = Some(d),
            FailureDomains::Azure(d) => raw.azure = Some(d),
            FailureDomains::Gcp(d) => raw.gcp = Some(d),
            FailureDomains::OpenStack(d) => raw.openstack = Some(d),
            FailureDomains::VSphere(d) => raw.vsphere = Some(d),
            FailureDomains::Nutanix(d) => raw.nutanix = Some(d),
        }
        raw
    }
}

/// AWS failure domain
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsFailureDomain {
    /// Availability zone placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<AwsPlacement>,

    /// Subnet reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<AwsResourceReference>,
}

/// AWS placement
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsPlacement {
    /// Availability zone name
    pub availability_zone: String,
}

/// AWS resource reference, keyed by `type`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AwsResourceReference {
    /// By resource ID
    #[serde(rename = "ID")]
    Id {
        /// Resource ID
        id: String,
    },
    /// By ARN
    #[serde(rename = "ARN")]
    Arn {
        /// Resource ARN
        arn: String,
    },
    /// By tag filters
    Filters {
        /// Filters, all of which must match
        filters: Vec<AwsResourceFilter>,
    },
}

/// AWS resource filter
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AwsResourceFilter {
    /// Filter name
    pub name: String,

    /// Accepted values
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Azure failure domain
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AzureFailureDomain {
    /// Availability zone
    pub zone: String,

    /// Subnet name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

/// GCP failure domain
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GcpFailureDomain {
    /// Zone
    pub zone: String,
}

/// OpenStack failure domain
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenStackFailureDomain {
    /// Compute availability zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    /// Root volume placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<RootVolume>,
}

/// OpenStack root volume
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RootVolume {
    /// Volume availability zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    /// Volume type
    pub volume_type: String,
}

/// vSphere failure domain
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VSphereFailureDomain {
    /// Failure domain name from the infrastructure resource
    pub name: String,
}

/// Nutanix failure domain reference
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NutanixFailureDomainReference {
    /// Failure domain name from the infrastructure resource
    pub name: String,
}

/// Null reads as the default, matching the validator's view of null as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// String map where a null map or a null value is dropped.
fn string_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect())
}
