//! Operator-tunable admission settings.
//!
//! Settings choose the discriminator policy, the structural default values,
//! extra per-platform defaults and the reported root path. Every field has a
//! default, so an empty source yields the built-in behaviour.

#[cfg(feature = "settings")]
mod builder;
#[cfg(feature = "settings")]
mod loader;

#[cfg(feature = "settings")]
pub use builder::AdmissionSettingsBuilder;
#[cfg(feature = "settings")]
pub(crate) use loader::SettingsLoader;

use crate::core::{DefaultSpec, DiscriminatorPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "MACHINESET_ADMISSION";

/// Default separator for nested environment keys.
pub const ENV_SEPARATOR: &str = "__";

/// Settings a validator is built from.
///
/// # Examples
///
/// ```rust
/// use machineset_admission::settings::AdmissionSettings;
/// use machineset_admission::core::DiscriminatorPolicy;
///
/// let settings: AdmissionSettings = serde_json::from_str(
///     r#"{"discriminator_policy": "fail-closed", "default_replicas": 5}"#,
/// )
/// .unwrap();
///
/// assert_eq!(settings.discriminator_policy, DiscriminatorPolicy::FailClosed);
/// assert_eq!(settings.default_replicas, 5);
/// assert_eq!(settings.default_state, "Inactive");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionSettings {
    /// Policy for failure-domain platforms with no registered branch.
    pub discriminator_policy: DiscriminatorPolicy,
    /// Prefix of every reported violation path.
    pub root_path: String,
    /// Replica count written when `replicas` is absent.
    pub default_replicas: i64,
    /// Strategy written when `strategy.type` is absent.
    pub default_strategy: String,
    /// State written when `state` is absent.
    pub default_state: String,
    /// Extra defaults per platform, relative to the failure-domain node.
    ///
    /// Keys match platform names case-insensitively.
    pub platform_defaults: BTreeMap<String, Vec<DefaultSpec>>,
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            discriminator_policy: DiscriminatorPolicy::FailOpen,
            root_path: "spec".to_string(),
            default_replicas: 3,
            default_strategy: "RollingUpdate".to_string(),
            default_state: "Inactive".to_string(),
            platform_defaults: BTreeMap::new(),
        }
    }
}

impl AdmissionSettings {
    /// Top-level keys a settings document may carry.
    pub const KEYS: [&'static str; 6] = [
        "discriminator_policy",
        "root_path",
        "default_replicas",
        "default_strategy",
        "default_state",
        "platform_defaults",
    ];
}

#[cfg(feature = "settings")]
impl AdmissionSettings {
    /// Create a new builder for loading settings from files and environment.
    pub fn builder() -> AdmissionSettingsBuilder {
        AdmissionSettingsBuilder::new()
    }
}
