//! A single validator shared across threads.

mod common;

use common::spec_with;
use machineset_admission::prelude::*;
use serde_json::{Value, json};
use std::sync::{Arc, Barrier};
use std::thread;

fn inputs() -> Vec<Value> {
    vec![
        spec_with(json!({"platform": ""})),
        spec_with(json!({"platform": "OpenStack", "openstack": [{}]})),
        spec_with(json!({"platform": "OpenStack", "aws": [{}]})),
        spec_with(json!({"platform": "Azure", "azure": [{"zone": "1", "subnet": "-"}]})),
        spec_with(json!({"platform": "Nutanix", "nutanix": [{"name": "fd-1"}]})),
        json!({"replicas": 7}),
    ]
}

#[test]
fn test_concurrent_validation_matches_sequential() {
    let validator = Arc::new(machineset::validator(&AdmissionSettings::default()).unwrap());
    let inputs = Arc::new(inputs());
    let expected: Vec<_> = inputs.iter().map(|i| validator.validate(i)).collect();
    let expected = Arc::new(expected);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let validator = Arc::clone(&validator);
            let inputs = Arc::clone(&inputs);
            let expected = Arc::clone(&expected);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..50 {
                    let i = (t + round) % inputs.len();
                    assert_eq!(validator.validate(&inputs[i]), expected[i]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_default_validator_shared_between_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let validator = machineset::default_validator().unwrap();
                validator
                    .validate(&spec_with(json!({"platform": "GCP", "gcp": [{"zone": "a"}]})))
                    .is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_validator_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Validator>();
    assert_send_sync::<Violations>();
}
