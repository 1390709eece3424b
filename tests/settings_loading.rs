//! Integration tests for loading admission settings.

#![cfg(feature = "settings")]
#![allow(unsafe_code)] // For env var manipulation in tests

mod common;

use common::{FAILURE_DOMAINS, spec_with};
use machineset_admission::prelude::*;
use serde_json::json;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.yaml");
    fs::write(&path, include_str!("fixtures/settings.yaml")).unwrap();

    let settings = AdmissionSettings::builder().with_file(&path).build().unwrap();

    assert_eq!(settings.discriminator_policy, DiscriminatorPolicy::FailClosed);
    assert_eq!(settings.default_replicas, 5);
    assert_eq!(settings.default_state, "Active");
    assert_eq!(settings.default_strategy, "RollingUpdate");
    assert_eq!(settings.platform_defaults.len(), 1);
}

#[test]
fn test_validator_from_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.yaml");
    fs::write(&path, include_str!("fixtures/settings.yaml")).unwrap();

    let settings = AdmissionSettings::builder().with_file(&path).build().unwrap();
    let validator = machineset::validator(&settings).unwrap();

    let admitted = validator
        .validate(&spec_with(json!({
            "platform": "OpenStack",
            "openstack": [{"availabilityZone": "az0", "rootVolume": {"availabilityZone": "az0"}}]
        })))
        .unwrap();

    assert_eq!(admitted["replicas"], 5);
    assert_eq!(admitted["state"], "Active");
    assert_eq!(
        admitted["template"]["machines_v1beta1_machine_openshift_io"]["failureDomains"]["openstack"][0]["rootVolume"]["volumeType"],
        "standard"
    );

    let violations = validator
        .validate(&spec_with(json!({"platform": "Libvirt"})))
        .unwrap_err();
    assert_eq!(violations.violations()[0].kind(), ViolationKind::UnknownDiscriminator);
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.toml");
    fs::write(&path, "default_replicas = 3\nroot_path = \"spec\"\n").unwrap();

    // SAFETY: variables use a prefix no other test reads.
    unsafe {
        env::set_var("SETTINGS_IT_OVERRIDE_DEFAULT_REPLICAS", "5");
        env::set_var("SETTINGS_IT_OVERRIDE_ROOT_PATH", "controlPlane");
    }

    let settings = AdmissionSettings::builder()
        .with_file(&path)
        .with_env_overrides("SETTINGS_IT_OVERRIDE", "__")
        .build()
        .unwrap();

    unsafe {
        env::remove_var("SETTINGS_IT_OVERRIDE_DEFAULT_REPLICAS");
        env::remove_var("SETTINGS_IT_OVERRIDE_ROOT_PATH");
    }

    assert_eq!(settings.default_replicas, 5);
    assert_eq!(settings.root_path, "controlPlane");

    let validator = machineset::validator(&settings).unwrap();
    let violations = validator
        .validate(&spec_with(json!({"platform": "OpenStack", "openstack": [{}]})))
        .unwrap_err();
    let expected = FAILURE_DOMAINS.replacen("spec", "controlPlane", 1);
    assert_eq!(violations.violations()[0].path(), format!("{expected}.openstack[0]"));
}

#[test]
fn test_env_policy_override() {
    // SAFETY: variables use a prefix no other test reads.
    unsafe {
        env::set_var("SETTINGS_IT_POLICY_DISCRIMINATOR_POLICY", "fail-closed");
    }

    let settings = AdmissionSettings::builder()
        .with_env_overrides("SETTINGS_IT_POLICY", "__")
        .build()
        .unwrap();

    unsafe {
        env::remove_var("SETTINGS_IT_POLICY_DISCRIMINATOR_POLICY");
    }

    assert_eq!(settings.discriminator_policy, DiscriminatorPolicy::FailClosed);
}

#[test]
fn test_invalid_default_in_settings_fails_build() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(&path, r#"{"default_strategy": "BlueGreen"}"#).unwrap();

    let settings = AdmissionSettings::builder().with_file(&path).build().unwrap();
    let err = machineset::validator(&settings).unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidDefault { .. }));
    assert!(err.to_string().contains("strategy.type"));
}

#[test]
fn test_misspelled_settings_key_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.yaml");
    fs::write(&path, "discriminator_policy: fail-closed\ndefault_replica: 5\n").unwrap();

    let err = AdmissionSettings::builder().with_file(&path).build().unwrap_err();
    assert!(matches!(err, AdmissionError::LoadError(_)));
    assert!(err.to_string().contains("unknown key(s) default_replica;"));
    assert!(err.to_string().contains("settings.yaml"));
}

#[test]
fn test_bad_value_in_one_file_names_that_file() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("base.yaml");
    let overlay = temp_dir.path().join("overlay.json");
    fs::write(&base, "default_replicas: 5\n").unwrap();
    fs::write(&overlay, r#"{"default_replicas": "five"}"#).unwrap();

    let err = AdmissionSettings::builder()
        .with_file(&base)
        .with_file(&overlay)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("overlay.json"));
}

#[test]
fn test_unsupported_settings_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.ini");
    fs::write(&path, "default_replicas=5").unwrap();

    let err = AdmissionSettings::builder().with_file(&path).build().unwrap_err();
    assert!(matches!(err, AdmissionError::LoadError(_)));
}
