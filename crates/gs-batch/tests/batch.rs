use std::sync::Mutex;

use gs_batch::*;
use gs_core::Value;
use gs_graph::{ConfigError, ModelSpec, ScenarioBuilder, ScenarioConfig};
use proptest::prelude::*;

fn scenario(lists: &[usize]) -> ScenarioConfig {
    let mut b =
        ScenarioBuilder::parse("grid", "2012-01-01 00:00:00", "2012-01-01 01:00:00", 900).unwrap();
    let mut spec = ModelSpec::time_based("m", "constant", 900).with_output("p");
    for (i, &len) in lists.iter().enumerate() {
        let values: Vec<f64> = (0..len).map(|v| v as f64).collect();
        spec = spec.with_param(format!("k{i}"), values);
    }
    b.add_model(spec).unwrap();
    b.freeze().unwrap()
}

proptest! {
    #[test]
    fn cartesian_size_is_product(lists in prop::collection::vec(1usize..4, 0..4)) {
        let variants = expand(&scenario(&lists), ExpansionMode::Cartesian).unwrap();
        let expected: usize = lists.iter().product();
        prop_assert_eq!(variants.len(), expected);
        for (i, v) in variants.iter().enumerate() {
            prop_assert_eq!(v.id, i);
        }
    }

    #[test]
    fn aligned_size_is_common_length(len in 1usize..5, fields in 1usize..4) {
        let lists = vec![len; fields];
        let variants = expand(&scenario(&lists), ExpansionMode::Aligned).unwrap();
        prop_assert_eq!(variants.len(), len);
        for v in &variants {
            for value in v.assignments.values() {
                prop_assert_eq!(value, &Value::Float(v.id as f64));
            }
        }
    }

    #[test]
    fn aligned_mismatch_always_fails(a in 1usize..5, b in 1usize..5) {
        prop_assume!(a != b);
        let err = expand(&scenario(&[a, b]), ExpansionMode::Aligned).unwrap_err();
        let is_mismatch = matches!(err, ConfigError::MismatchedListLength { .. });
        prop_assert!(is_mismatch);
    }

    #[test]
    fn partition_covers_every_index_once(n in 0usize..50, workers in 0usize..9) {
        let blocks = partition(n, workers);
        prop_assert!(blocks.len() <= workers.max(1));
        let flat: Vec<usize> = blocks.into_iter().flatten().collect();
        prop_assert_eq!(flat, (0..n).collect::<Vec<_>>());
    }
}

#[test]
fn runs_every_variant() {
    let variants = expand(&scenario(&[3, 2]), ExpansionMode::Cartesian).unwrap();
    let report = BatchRunner::new(4)
        .run(&variants, |v| Ok::<_, String>(v.id * 10))
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.total(), 6);
    let ids: Vec<usize> = report.completed.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(report.completed[5].1, 50);
}

#[test]
fn failure_abandons_only_its_own_block() {
    // 8 variants, 2 workers: blocks 0..4 and 4..8
    let variants = expand(&scenario(&[8]), ExpansionMode::Cartesian).unwrap();
    let seen = Mutex::new(Vec::new());
    let report = BatchRunner::new(2)
        .run(&variants, |v| {
            seen.lock().unwrap().push(v.id);
            if v.id == 1 {
                Err(format!("variant {} diverged", v.id))
            } else {
                Ok(())
            }
        })
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(
        report.failed,
        vec![VariantFailure {
            id: 1,
            worker: 0,
            message: "variant 1 diverged".into(),
        }]
    );
    assert_eq!(report.abandoned, vec![2, 3]);
    let done: Vec<usize> = report.completed.iter().map(|(id, _)| *id).collect();
    assert_eq!(done, vec![0, 4, 5, 6, 7]);

    let mut seen = seen.into_inner().unwrap();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 4, 5, 6, 7]);
}

#[test]
fn empty_batch_is_a_no_op() {
    let report = BatchRunner::new(3)
        .run(&[], |_| Ok::<(), String>(()))
        .unwrap();
    assert_eq!(report.total(), 0);
    assert!(report.is_success());
}

#[test]
fn zero_workers_means_one() {
    assert_eq!(BatchRunner::new(0).workers(), 1);
}

#[test]
fn panicking_variant_is_reported_as_failure() {
    let variants = expand(&scenario(&[8]), ExpansionMode::Cartesian).unwrap();
    let report = BatchRunner::new(2)
        .run(&variants, |v| {
            if v.id == 0 {
                panic!("model blew up");
            }
            Ok::<_, String>(v.id)
        })
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, 0);
    assert_eq!(report.failed[0].worker, 0);
    assert!(report.failed[0].message.contains("model blew up"));
    assert_eq!(report.abandoned, vec![1, 2, 3]);
    let done: Vec<usize> = report.completed.iter().map(|(id, _)| *id).collect();
    assert_eq!(done, vec![4, 5, 6, 7]);
}
