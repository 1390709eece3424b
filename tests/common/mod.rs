//! Shared fixtures for integration tests.

#![allow(dead_code)]

use machineset_admission::error::Violations;
use serde_json::{Value, json};

/// Path of the failure-domain union under the default root.
pub const FAILURE_DOMAINS: &str = "spec.template.machines_v1beta1_machine_openshift_io.failureDomains";

/// A complete spec except for `failureDomains`, which is supplied.
pub fn spec_with(failure_domains: Value) -> Value {
    json!({
        "selector": {
            "matchLabels": {
                "machine.openshift.io/cluster-api-machine-role": "master",
                "machine.openshift.io/cluster-api-machine-type": "master"
            }
        },
        "template": {
            "machineType": "machines_v1beta1_machine_openshift_io",
            "machines_v1beta1_machine_openshift_io": {
                "failureDomains": failure_domains,
                "metadata": {
                    "labels": {
                        "machine.openshift.io/cluster-api-machine-role": "master",
                        "machine.openshift.io/cluster-api-machine-type": "master",
                        "machine.openshift.io/cluster-api-cluster": "ci-cluster"
                    }
                },
                "spec": {"providerSpec": {}}
            }
        }
    })
}

/// Mutable handle on the OpenShift machine template of a spec.
pub fn template_mut(spec: &mut Value) -> &mut Value {
    &mut spec["template"]["machines_v1beta1_machine_openshift_io"]
}

/// Rendered violations, or an empty list when admitted.
pub fn messages(result: Result<Value, Violations>) -> Vec<String> {
    match result {
        Ok(_) => Vec::new(),
        Err(violations) => violations.messages(),
    }
}
