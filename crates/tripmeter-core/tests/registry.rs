//! Registry behaviour: registration, label validation, counters, histograms.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tripmeter_core::metrics::{
    render, Buckets, FamilyType, LabelSet, MetricKind, MetricRegistry, SeriesValue,
};
use tripmeter_core::TripmeterError;

const HTTP_LABELS: [&str; 3] = ["method", "route", "status"];

fn get_ok() -> LabelSet {
    LabelSet::from([("method", "GET"), ("route", "/trip/:id"), ("status", "200")])
}

#[test]
fn reregistration_with_same_signature_returns_existing_family() {
    let reg = MetricRegistry::new();
    let a = reg.register_counter("http_requests_total", "Total requests", &HTTP_LABELS).unwrap();
    let b = reg.register_counter("http_requests_total", "Total requests", &HTTP_LABELS).unwrap();

    assert!(a.same_family(&b));
    assert_eq!(reg.len(), 1);

    reg.inc(&a, &get_ok()).unwrap();
    assert_eq!(reg.counter_value(&b, &get_ok()).unwrap(), Some(1));
}

#[test]
fn conflicting_registration_is_duplicate_name() {
    let reg = MetricRegistry::new();
    reg.register_counter("dup", "help", &HTTP_LABELS).unwrap();

    let err = reg
        .register_histogram("dup", "help", Buckets::default(), &HTTP_LABELS)
        .expect_err("different kind must fail");
    assert!(matches!(err, TripmeterError::DuplicateMetricName { ref name } if name == "dup"));

    let err = reg
        .register_counter("dup", "help", &["method"])
        .expect_err("different labels must fail");
    assert!(matches!(err, TripmeterError::DuplicateMetricName { .. }));

    let err = reg
        .register_counter("dup", "other help", &HTTP_LABELS)
        .expect_err("different help must fail");
    assert!(matches!(err, TripmeterError::DuplicateMetricName { .. }));

    assert_eq!(reg.len(), 1);
}

#[test]
fn histogram_buckets_are_part_of_the_signature() {
    let reg = MetricRegistry::new();
    let b1 = Buckets::new(&[0.5, 1.0]).unwrap();
    let b2 = Buckets::new(&[0.5, 2.0]).unwrap();
    reg.register("lat", "latency", FamilyType::Histogram(b1.clone()), &[]).unwrap();
    assert!(reg.register("lat", "latency", FamilyType::Histogram(b1), &[]).is_ok());
    assert!(reg.register("lat", "latency", FamilyType::Histogram(b2), &[]).is_err());
}

#[test]
fn invalid_names_are_rejected() {
    let reg = MetricRegistry::new();
    assert!(matches!(
        reg.register_counter("1bad", "h", &[]),
        Err(TripmeterError::InvalidMetricName(_))
    ));
    assert!(reg.register_counter("ok", "h", &["a-b"]).is_err());
    assert!(reg.register_counter("ok", "h", &["a", "a"]).is_err());
    assert!(reg
        .register_histogram("ok_hist", "h", Buckets::default(), &["le"])
        .is_err());
    assert!(reg.is_empty());
}

#[test]
fn label_order_does_not_affect_identity() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c", "h", &HTTP_LABELS).unwrap();

    let forward = LabelSet::new()
        .with("method", "GET")
        .with("route", "/trip/:id")
        .with("status", "200");
    let backward = LabelSet::new()
        .with("status", "200")
        .with("route", "/trip/:id")
        .with("method", "GET");
    assert_eq!(forward, backward);

    reg.inc(&c, &forward).unwrap();
    reg.inc(&c, &backward).unwrap();
    assert_eq!(reg.counter_value(&c, &get_ok()).unwrap(), Some(2));
    assert_eq!(reg.snapshot()[0].series.len(), 1);
}

#[test]
fn missing_or_extra_labels_are_a_mismatch() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c", "h", &HTTP_LABELS).unwrap();
    let h = reg.register_histogram("h", "h", Buckets::default(), &HTTP_LABELS).unwrap();

    let missing = LabelSet::from([("method", "GET"), ("route", "/")]);
    let extra = get_ok().with("tenant", "acme");
    let renamed = LabelSet::from([("method", "GET"), ("path", "/"), ("status", "200")]);

    for bad in [&missing, &extra, &renamed] {
        assert!(matches!(reg.inc(&c, bad), Err(TripmeterError::LabelMismatch { .. })));
        assert!(matches!(
            reg.observe(&h, bad, 0.2),
            Err(TripmeterError::LabelMismatch { .. })
        ));
    }

    // Duplicate label names never match a family's declaration.
    let doubled = get_ok().with("status", "500");
    assert!(reg.inc(&c, &doubled).is_err());

    assert!(reg.snapshot().iter().all(|f| f.series.is_empty()));
}

#[test]
fn wrong_kind_is_rejected() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c", "h", &[]).unwrap();
    let h = reg.register_histogram("h", "h", Buckets::default(), &[]).unwrap();

    let err = reg.increment(&h, &LabelSet::new(), 1).unwrap_err();
    assert!(matches!(
        err,
        TripmeterError::WrongMetricKind {
            expected: MetricKind::Counter,
            actual: MetricKind::Histogram,
            ..
        }
    ));
    assert!(matches!(
        reg.observe(&c, &LabelSet::new(), 1.0),
        Err(TripmeterError::WrongMetricKind { .. })
    ));
}

#[test]
fn counter_equals_sum_of_deltas() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c", "h", &["k"]).unwrap();
    let labels = LabelSet::from([("k", "v")]);

    assert_eq!(reg.counter_value(&c, &labels).unwrap(), None);

    let mut last = 0;
    for delta in [1, 5, 0, 12, 3] {
        reg.increment(&c, &labels, delta).unwrap();
        let now = reg.counter_value(&c, &labels).unwrap().unwrap();
        assert!(now >= last);
        last = now;
    }
    assert_eq!(last, 21);
}

#[test]
fn histogram_buckets_are_cumulative_and_inclusive() {
    let reg = MetricRegistry::new();
    let h = reg.register_histogram("lat", "h", Buckets::default(), &[]).unwrap();
    let none = LabelSet::new();

    for v in [0.05, 0.1, 0.12, 0.7, 2.0, 9.0] {
        reg.observe(&h, &none, v).unwrap();
    }

    let snap = reg.histogram_snapshot(&h, &none).unwrap().unwrap();
    let counts: Vec<u64> = snap.buckets.iter().map(|(_, c)| *c).collect();
    // 0.1 is inclusive, so both 0.05 and 0.1 land in the first bucket.
    assert_eq!(counts, vec![2, 3, 3, 4, 4, 5, 5]);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(snap.count, 6);
    assert!((snap.sum - 11.97).abs() < 1e-9);
}

#[test]
fn non_finite_observations_are_rejected() {
    let reg = MetricRegistry::new();
    let h = reg.register_histogram("lat", "h", Buckets::default(), &[]).unwrap();
    for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(
            reg.observe(&h, &LabelSet::new(), v),
            Err(TripmeterError::InvalidObservation { .. })
        ));
    }
    assert_eq!(reg.histogram_snapshot(&h, &LabelSet::new()).unwrap(), None);

    reg.observe(&h, &LabelSet::new(), 0.4).unwrap();
    let snap = reg.histogram_snapshot(&h, &LabelSet::new()).unwrap().unwrap();
    assert_eq!(snap.count, 1);
    assert!(snap.sum.is_finite());
}

#[test]
fn bucket_validation() {
    assert!(Buckets::new(&[]).is_err());
    assert!(Buckets::new(&[1.0, 1.0]).is_err());
    assert!(Buckets::new(&[2.0, 1.0]).is_err());
    assert!(Buckets::new(&[0.1, f64::NAN]).is_err());
    assert_eq!(
        Buckets::new(&[0.5, 1.0, f64::INFINITY]).unwrap().bounds(),
        &[0.5, 1.0]
    );
    assert_eq!(
        Buckets::default().bounds(),
        &[0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0]
    );
}

#[test]
fn concurrent_increments_are_not_lost() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 10_000;

    let reg = MetricRegistry::new();
    let c = reg.register_counter("c", "h", &HTTP_LABELS).unwrap();
    let h = reg.register_histogram("h", "h", Buckets::default(), &HTTP_LABELS).unwrap();

    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let labels = get_ok();
                for _ in 0..PER_THREAD {
                    reg.inc(&c, &labels).unwrap();
                    reg.observe(&h, &labels, 0.2).unwrap();
                }
            });
        }
    });

    assert_eq!(
        reg.counter_value(&c, &get_ok()).unwrap(),
        Some(THREADS * PER_THREAD)
    );
    let snap = reg.histogram_snapshot(&h, &get_ok()).unwrap().unwrap();
    assert_eq!(snap.count, THREADS * PER_THREAD);
    assert_eq!(snap.buckets[0].1, 0);
    assert_eq!(snap.buckets[1].1, THREADS * PER_THREAD);
}

#[test]
fn snapshots_taken_during_observation_are_never_torn() {
    const THREADS: u64 = 4;
    const PER_THREAD: u64 = 5_000;
    const VALUE: f64 = 0.2;

    let reg = MetricRegistry::new();
    let h = reg.register_histogram("h", "h", Buckets::default(), &HTTP_LABELS).unwrap();

    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let labels = get_ok();
                for _ in 0..PER_THREAD {
                    reg.observe(&h, &labels, VALUE).unwrap();
                }
            });
        }

        for _ in 0..2_000 {
            for fam in reg.snapshot() {
                for series in fam.series {
                    let SeriesValue::Histogram(snap) = series.value else {
                        panic!("histogram family holds a non-histogram series");
                    };
                    let last = snap.buckets.last().unwrap().1;
                    assert!(last <= snap.count);
                    // Every observation is 0.2, so all finite buckets from 0.3 up match count.
                    assert_eq!(last, snap.count);
                    assert!(snap.buckets.windows(2).all(|w| w[0].1 <= w[1].1));
                    let expected = VALUE * snap.count as f64;
                    assert!((snap.sum - expected).abs() < 1e-6 * expected.max(1.0));
                }
            }
            render(&reg.snapshot()).unwrap();
        }
    });

    let snap = reg.histogram_snapshot(&h, &get_ok()).unwrap().unwrap();
    assert_eq!(snap.count, THREADS * PER_THREAD);
}

#[test]
fn snapshot_keeps_registration_order() {
    let reg = MetricRegistry::new();
    reg.register_counter("zeta", "h", &[]).unwrap();
    reg.register_histogram("alpha", "h", Buckets::default(), &[]).unwrap();
    reg.register_counter("mid", "h", &[]).unwrap();

    let names: Vec<String> = reg.snapshot().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}
