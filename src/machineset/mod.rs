//! Admission schema for the control-plane machine set `spec`.
//!
//! The machine set `spec` carries two unions. `template` is keyed by `machineType` and
//! `template.machines_v1beta1_machine_openshift_io.failureDomains` is keyed
//! by `platform`.
//!
//! # Examples
//!
//! ```rust
//! use machineset_admission::machineset;
//! use serde_json::json;
//!
//! let validator = machineset::default_validator().unwrap();
//! let violations = validator
//!     .validate(&json!({
//!         "selector": {},
//!         "template": {
//!             "machineType": "machines_v1beta1_machine_openshift_io",
//!             "machines_v1beta1_machine_openshift_io": {
//!                 "failureDomains": {"platform": "OpenStack", "aws": [{}]},
//!                 "metadata": {"labels": {
//!                     "machine.openshift.io/cluster-api-machine-role": "master",
//!                     "machine.openshift.io/cluster-api-machine-type": "master",
//!                     "machine.openshift.io/cluster-api-cluster": "cluster-1"
//!                 }},
//!                 "spec": {}
//!             }
//!         }
//!     }))
//!     .unwrap_err();
//!
//! assert_eq!(violations.len(), 1);
//! ```

mod failure_domains;
mod platform;
mod spec;
pub mod types;

pub use failure_domains::{DISCRIMINATOR, failure_domains};
pub use platform::{PlatformType, UnknownPlatform};
pub use spec::{MACHINE_TYPE, OPENSHIFT_MACHINE_V1BETA1, SUPPORTED_REPLICAS, control_plane_machine_set};

use crate::core::{DefaultSpec, SchemaNode, Validator};
use crate::error::{AdmissionError, Result};
use crate::settings::AdmissionSettings;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static DEFAULT_VALIDATOR: LazyLock<Result<Validator>> =
    LazyLock::new(|| validator(&AdmissionSettings::default()));

/// Build a machine set validator from settings.
///
/// # Errors
///
/// Returns an error if a platform default names an unknown platform or path,
/// or if a configured default would itself be rejected.
pub fn validator(settings: &AdmissionSettings) -> Result<Validator> {
    let mut domains = failure_domains(settings.discriminator_policy)?;
    attach_platform_defaults(&mut domains, &settings.platform_defaults)?;

    Validator::builder(control_plane_machine_set(domains)?)
        .root_path(settings.root_path.as_str())
        .with_default(DefaultSpec::new("replicas", settings.default_replicas))
        .with_default(DefaultSpec::new("state", settings.default_state.as_str()))
        .with_default(DefaultSpec::new("strategy.type", settings.default_strategy.as_str()))
        .build()
}

/// Process-wide validator built from default settings.
///
/// # Errors
///
/// Returns the build error if the built-in tables are malformed.
pub fn default_validator() -> std::result::Result<&'static Validator, &'static AdmissionError> {
    DEFAULT_VALIDATOR.as_ref()
}

fn attach_platform_defaults(
    domains: &mut SchemaNode,
    platform_defaults: &BTreeMap<String, Vec<DefaultSpec>>,
) -> Result<()> {
    let schema = domains.name().to_string();
    let Some(union) = domains.union_schema_mut() else {
        return Ok(());
    };

    for (platform, defaults) in platform_defaults {
        let branch = union
            .registry_mut()
            .branches_mut()
            .find(|b| b.value().eq_ignore_ascii_case(platform))
            .ok_or_else(|| AdmissionError::InvalidDefault {
                path: platform.clone(),
                schema: schema.clone(),
                reason: format!("no failure-domain branch for platform '{platform}'"),
            })?;

        debug!(platform = branch.value(), defaults = defaults.len(), "attaching platform defaults");
        for default in defaults {
            branch.push_default(default.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_validator_builds() {
        let validator = default_validator().unwrap();
        assert_eq!(validator.root_path(), "spec");
    }

    #[test]
    fn test_platform_defaults_case_insensitive() {
        let mut settings = AdmissionSettings::default();
        settings.platform_defaults.insert(
            "openstack".to_string(),
            vec![DefaultSpec::new("openstack.rootVolume.volumeType", "standard")],
        );
        let validator = validator(&settings).unwrap();

        let defaulted = validator.default_only(&json!({
            "template": {
                "machineType": OPENSHIFT_MACHINE_V1BETA1,
                OPENSHIFT_MACHINE_V1BETA1: {
                    "failureDomains": {
                        "platform": "OpenStack",
                        "openstack": [{"availabilityZone": "az1", "rootVolume": {"availabilityZone": "az1"}}]
                    }
                }
            }
        }));

        assert_eq!(
            defaulted["template"][OPENSHIFT_MACHINE_V1BETA1]["failureDomains"]["openstack"][0]["rootVolume"],
            json!({"availabilityZone": "az1", "volumeType": "standard"})
        );
    }

    #[test]
    fn test_unknown_platform_default_rejected() {
        let mut settings = AdmissionSettings::default();
        settings
            .platform_defaults
            .insert("BareMetal".to_string(), vec![DefaultSpec::new("baremetal", json!([]))]);

        let err = validator(&settings).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidDefault { .. }));
    }

    #[test]
    fn test_unresolvable_platform_default_path_rejected() {
        let mut settings = AdmissionSettings::default();
        settings.platform_defaults.insert(
            "AWS".to_string(),
            vec![DefaultSpec::new("aws.instanceType", "m5.large")],
        );
        assert!(validator(&settings).is_err());
    }

    #[test]
    fn test_invalid_structural_default_rejected() {
        let settings = AdmissionSettings {
            default_replicas: 4,
            ..AdmissionSettings::default()
        };
        let err = validator(&settings).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidDefault { .. }));
    }
}
