//! Validation throughput benchmarks.
//!
//! Measures admission of well-formed specs, rejection of specs carrying
//! several violations, defaulting alone, and a shared validator under
//! concurrent callers.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use machineset_admission::prelude::*;
use serde_json::{Value, json};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn spec(failure_domains: Value) -> Value {
    json!({
        "selector": {"matchLabels": {"machine.openshift.io/cluster-api-machine-role": "master"}},
        "template": {
            "machineType": "machines_v1beta1_machine_openshift_io",
            "machines_v1beta1_machine_openshift_io": {
                "failureDomains": failure_domains,
                "metadata": {
                    "labels": {
                        "machine.openshift.io/cluster-api-machine-role": "master",
                        "machine.openshift.io/cluster-api-machine-type": "master",
                        "machine.openshift.io/cluster-api-cluster": "bench"
                    }
                },
                "spec": {"providerSpec": {}}
            }
        }
    })
}

fn openstack_domains(count: usize) -> Value {
    let domains: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "availabilityZone": format!("az{i}"),
                "rootVolume": {"availabilityZone": format!("az{i}"), "volumeType": "fast"}
            })
        })
        .collect();
    json!({"platform": "OpenStack", "openstack": domains})
}

fn invalid_spec() -> Value {
    let mut spec = spec(json!({
        "platform": "OpenStack",
        "openstack": [{"availabilityZone": "a b"}, {}, {"rootVolume": {}}]
    }));
    spec["replicas"] = json!(4);
    spec
}

/// Admission of valid specs as the failure-domain list grows
fn benchmark_validate_valid(c: &mut Criterion) {
    let validator = machineset::default_validator().unwrap();

    let mut group = c.benchmark_group("validate_valid");
    for count in [1, 3, 16, 64] {
        let input = spec(openstack_domains(count));
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| black_box(validator.validate(black_box(input)).is_ok()));
        });
    }
    group.finish();
}

/// Rejection with several independent violations
fn benchmark_validate_invalid(c: &mut Criterion) {
    let validator = machineset::default_validator().unwrap();
    let input = invalid_spec();

    let mut group = c.benchmark_group("validate_invalid");
    group.bench_function("four_violations", |b| {
        b.iter(|| black_box(validator.validate(black_box(&input)).unwrap_err().len()));
    });
    group.bench_function("foreign_branch", |b| {
        let input = spec(json!({"platform": "GCP", "gcp": [{"zone": "a"}], "aws": [{}]}));
        b.iter(|| black_box(validator.validate(black_box(&input)).is_err()));
    });
    group.finish();
}

/// Defaulting without validation
fn benchmark_default_only(c: &mut Criterion) {
    let validator = machineset::default_validator().unwrap();
    let input = spec(openstack_domains(3));

    let mut group = c.benchmark_group("default_only");
    group.bench_function("openstack_3", |b| {
        b.iter(|| black_box(validator.default_only(black_box(&input))));
    });
    group.finish();
}

/// One validator shared by a varying number of threads
fn benchmark_concurrent_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_validation");
    group.measurement_time(Duration::from_secs(10));

    for num_threads in [1, 2, 4, 8] {
        group.throughput(Throughput::Elements(num_threads as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{num_threads}_threads")),
            &num_threads,
            |b, &num_threads| {
                let validator =
                    Arc::new(machineset::validator(&AdmissionSettings::default()).unwrap());
                let input = Arc::new(spec(openstack_domains(3)));

                b.iter_custom(|iters| {
                    let barrier = Arc::new(Barrier::new(num_threads + 1));
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let validator = Arc::clone(&validator);
                            let input = Arc::clone(&input);
                            let barrier = Arc::clone(&barrier);
                            thread::spawn(move || {
                                barrier.wait();
                                let start = std::time::Instant::now();
                                for _ in 0..iters {
                                    black_box(validator.validate(&input).is_ok());
                                }
                                start.elapsed()
                            })
                        })
                        .collect();

                    barrier.wait();

                    let total: Duration = handles.into_iter().map(|h| h.join().unwrap()).sum();
                    total / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_validate_valid,
    benchmark_validate_invalid,
    benchmark_default_only,
    benchmark_concurrent_validation,
);

criterion_main!(benches);
