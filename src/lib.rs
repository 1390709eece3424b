//! # machineset-admission
//!
//! Platform-discriminated validation and defaulting for control-plane machine set specs.
//!
//! ## Overview
//!
//! `machineset-admission` admits configuration objects whose shape depends on
//! a discriminator field:
//! - Structural defaults, then branch defaults once the discriminator is known
//! - Union exclusivity: only the selected branch's payload may be populated
//! - Declarative field rules with Kubernetes-style violation messages
//! - Every independent violation reported in one pass, with its field path
//!
//! ## Quick Start
//!
//! ```rust
//! use machineset_admission::prelude::*;
//! use serde_json::json;
//!
//! let validator = machineset::default_validator().unwrap();
//!
//! let admitted = validator
//!     .validate(&json!({
//!         "selector": {"matchLabels": {}},
//!         "template": {
//!             "machineType": "machines_v1beta1_machine_openshift_io",
//!             "machines_v1beta1_machine_openshift_io": {
//!                 "failureDomains": {
//!                     "platform": "OpenStack",
//!                     "openstack": [{"availabilityZone": "az1"}]
//!                 },
//!                 "metadata": {"labels": {
//!                     "machine.openshift.io/cluster-api-machine-role": "master",
//!                     "machine.openshift.io/cluster-api-machine-type": "master",
//!                     "machine.openshift.io/cluster-api-cluster": "cluster-1"
//!                 }},
//!                 "spec": {}
//!             }
//!         }
//!     }))
//!     .unwrap();
//!
//! assert_eq!(admitted["replicas"], 3);
//! assert_eq!(admitted["strategy"]["type"], "RollingUpdate");
//! ```
//!
//! ## Custom schemas
//!
//! The [`core`] module is platform-agnostic. Build a [`core::SchemaNode`],
//! attach a [`core::UnionSchema`] and hand it to [`core::Validator::builder`].
//!
//! ## Feature Flags
//!
//! - `settings` (default): load [`settings::AdmissionSettings`] from files and environment
//! - `yaml` (default): [`core::Validator::validate_yaml`]

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod machineset;
pub mod settings;

#[cfg(feature = "settings")]
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        Branch, DefaultSpec, DiscriminatorPolicy, FieldSchema, FieldType, SchemaNode,
        SchemaRegistry, UnionSchema, Validator, ValidatorBuilder,
    };
    pub use crate::error::{AdmissionError, Result, Violation, ViolationKind, Violations};
    pub use crate::machineset::{self, PlatformType};
    pub use crate::settings::AdmissionSettings;
}
