//! Property-based tests for knownness partitioning.
//!
//! Random train/test frames with two tracked numeric identifiers, a feature
//! with missing values, and a label. Every split must cover the test set
//! exactly once, agree with an independent membership check, and prune the
//! right columns.

use std::collections::HashSet;

use ndarray::Array1;
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use partition_ensemble::frame::Frame;
use partition_ensemble::partition::Partitioner;
use partition_ensemble::transform::subsample;

const TRACKED: [&str; 2] = ["a", "b"];

// =============================================================================
// Strategies
// =============================================================================

/// Identifier in `0..6`, missing one time in eight.
fn arb_id() -> impl Strategy<Value = f64> {
    prop_oneof![
        7 => (0u8..6).prop_map(f64::from),
        1 => Just(f64::NAN),
    ]
}

fn arb_feature() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => (-10.0f64..10.0),
        1 => Just(f64::NAN),
    ]
}

/// Columns `a, b, f, y` of one frame.
fn arb_rows(max: usize) -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop_vec((arb_id(), arb_id(), arb_feature(), (0u8..2).prop_map(f64::from)), 1..max)
}

fn frame(rows: &[(f64, f64, f64, f64)], first_index: usize) -> Frame {
    let column = |f: fn(&(f64, f64, f64, f64)) -> f64| rows.iter().map(f).collect::<Array1<f64>>();
    Frame::builder()
        .numeric("a", column(|r| r.0))
        .numeric("b", column(|r| r.1))
        .numeric("f", column(|r| r.2))
        .numeric("y", column(|r| r.3))
        .index(first_index..first_index + rows.len())
        .build()
        .unwrap()
}

fn distinct(values: &[f64]) -> HashSet<u64> {
    values.iter().filter(|v| !v.is_nan()).map(|v| v.to_bits()).collect()
}

const TEST_OFFSET: usize = 500;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn partitions_cover_test_rows_once(
        train_rows in arb_rows(30),
        test_rows in arb_rows(30),
    ) {
        let train = frame(&train_rows, 0);
        let test = frame(&test_rows, TEST_OFFSET);
        let partitions = Partitioner::new(TRACKED, "y").split(&train, &test).unwrap();

        let mut seen: Vec<usize> = partitions.values().flat_map(|p| p.test.index().to_vec()).collect();
        seen.sort_unstable();
        let expected: Vec<usize> = test.index().to_vec();
        prop_assert_eq!(seen, expected);

        let total: usize = partitions.values().map(|p| p.n_rows()).sum();
        prop_assert_eq!(total, test.n_rows());
        prop_assert!(partitions.values().all(|p| p.n_rows() > 0));
    }

    #[test]
    fn keys_match_recomputed_membership(
        train_rows in arb_rows(30),
        test_rows in arb_rows(30),
    ) {
        let train = frame(&train_rows, 0);
        let test = frame(&test_rows, TEST_OFFSET);
        let partitions = Partitioner::new(TRACKED, "y").split(&train, &test).unwrap();

        let known_a = distinct(&train_rows.iter().map(|r| r.0).collect::<Vec<_>>());
        let known_b = distinct(&train_rows.iter().map(|r| r.1).collect::<Vec<_>>());

        for (key, partition) in &partitions {
            prop_assert_eq!(key, &partition.key);
            for &label in partition.test.index() {
                let (a, b, _, _) = test_rows[label - TEST_OFFSET];
                let a_known = !a.is_nan() && known_a.contains(&(a + 0.0).to_bits());
                let b_known = !b.is_nan() && known_b.contains(&(b + 0.0).to_bits());
                prop_assert_eq!(key.known(), &[a_known, b_known][..]);
            }
        }
    }

    #[test]
    fn pruned_columns_follow_key_and_missing_values(
        train_rows in arb_rows(30),
        test_rows in arb_rows(30),
    ) {
        let train = frame(&train_rows, 0);
        let test = frame(&test_rows, TEST_OFFSET);
        let partitions = Partitioner::new(TRACKED, "y").split(&train, &test).unwrap();

        for partition in partitions.values() {
            let kept: Vec<&str> = partition.test.column_names().collect();
            let kept_train: Vec<&str> = partition.train.column_names().collect();
            prop_assert_eq!(&kept, &kept_train);
            prop_assert!(kept.contains(&"y"));

            for position in partition.key.unknown_positions() {
                prop_assert!(!kept.contains(&TRACKED[position]));
            }
            for (name, column) in partition.test.columns() {
                if name != "y" {
                    prop_assert!(!column.has_missing(), "{} kept with missing values", name);
                }
            }
        }
    }

    #[test]
    fn subsample_never_exceeds_training_rows(
        train_rows in arb_rows(40),
        size in 0usize..60,
        seed in any::<u64>(),
    ) {
        let train = frame(&train_rows, 0);
        let sampled = subsample(&train, size, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(sampled.n_rows(), size.min(train.n_rows()));
        prop_assert_eq!(sampled.n_columns(), train.n_columns());

        let labels: HashSet<usize> = sampled.index().iter().copied().collect();
        prop_assert_eq!(labels.len(), sampled.n_rows());
    }
}
