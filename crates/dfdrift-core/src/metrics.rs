//! Comparison metrics between two distributions of the same kind.
//!
//! - [`distance`]: sum of squared relative-frequency differences over the
//!   union of keys. Symmetric, zero for identical distributions.
//! - [`significance`]: p-value of the two-sample chi-square homogeneity test
//!   on the aligned absolute counts. Small values mean the distributions
//!   differ.
//!
//! Alignment orders keys by their natural ordering so the count vectors are
//! reproducible across runs.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::frequency::FrequencyStore;
use dfdrift_common::{Error, Result};
use dfdrift_math::{homogeneity_test, HomogeneityTest};

/// Σ over the key union of `(a[k] - b[k])²`, absent keys counting as zero.
pub fn squared_distance<K: Eq + Hash>(a: &HashMap<K, f64>, b: &HashMap<K, f64>) -> f64 {
    let shared_and_left: f64 = a
        .iter()
        .map(|(k, &va)| {
            let d = va - b.get(k).copied().unwrap_or(0.0);
            d * d
        })
        .sum();
    let right_only: f64 = b
        .iter()
        .filter(|(k, _)| !a.contains_key(*k))
        .map(|(_, &vb)| vb * vb)
        .sum();
    shared_and_left + right_only
}

/// Absolute counts of two stores over the sorted union of their keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedCounts<K> {
    pub keys: Vec<K>,
    pub left: Vec<u64>,
    pub right: Vec<u64>,
}

pub fn aligned_counts<K: Eq + Hash + Ord + Clone>(
    left: &FrequencyStore<K>,
    right: &FrequencyStore<K>,
) -> AlignedCounts<K> {
    let keys: Vec<K> = left
        .absolute()
        .keys()
        .chain(right.absolute().keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    let left_counts = keys.iter().map(|k| left.count(k)).collect();
    let right_counts = keys.iter().map(|k| right.count(k)).collect();
    AlignedCounts {
        keys,
        left: left_counts,
        right: right_counts,
    }
}

/// One key of an aligned comparison, rendered for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub key: String,
    pub left: u64,
    pub right: u64,
}

fn rows_from<K: ToString>(aligned: AlignedCounts<K>) -> Vec<ComparisonRow> {
    aligned
        .keys
        .iter()
        .zip(aligned.left.iter().zip(aligned.right.iter()))
        .map(|(k, (&left, &right))| ComparisonRow {
            key: k.to_string(),
            left,
            right,
        })
        .collect()
}

fn mismatch(a: &Distribution, b: &Distribution) -> Error {
    Error::TypeMismatch {
        left: a.kind(),
        right: b.kind(),
    }
}

/// Side-by-side counts for every key of either distribution, in key order.
pub fn comparison_rows(a: &Distribution, b: &Distribution) -> Result<Vec<ComparisonRow>> {
    match (a, b) {
        (Distribution::DirectlyFollows(x), Distribution::DirectlyFollows(y)) => {
            Ok(rows_from(aligned_counts(x, y)))
        }
        (Distribution::Activity(x), Distribution::Activity(y)) => Ok(rows_from(aligned_counts(x, y))),
        _ => Err(mismatch(a, b)),
    }
}

/// Squared-difference distance between the relative frequencies of `a`
/// and `b`.
pub fn distance(a: &Distribution, b: &Distribution) -> Result<f64> {
    match (a, b) {
        (Distribution::DirectlyFollows(x), Distribution::DirectlyFollows(y)) => {
            Ok(squared_distance(x.relative(), y.relative()))
        }
        (Distribution::Activity(x), Distribution::Activity(y)) => {
            Ok(squared_distance(x.relative(), y.relative()))
        }
        _ => Err(mismatch(a, b)),
    }
}

/// Full chi-square homogeneity test of `a` against `b`.
///
/// Fails with [`Error::InsufficientData`] when the aligned counts have fewer
/// than two keys or either side is empty.
pub fn chi_square_test(a: &Distribution, b: &Distribution) -> Result<HomogeneityTest> {
    let (left, right) = match (a, b) {
        (Distribution::DirectlyFollows(x), Distribution::DirectlyFollows(y)) => {
            let aligned = aligned_counts(x, y);
            (aligned.left, aligned.right)
        }
        (Distribution::Activity(x), Distribution::Activity(y)) => {
            let aligned = aligned_counts(x, y);
            (aligned.left, aligned.right)
        }
        _ => return Err(mismatch(a, b)),
    };
    homogeneity_test(&left, &right).map_err(|e| Error::InsufficientData(e.to_string()))
}

/// p-value of the chi-square homogeneity test of `a` against `b`.
pub fn significance(a: &Distribution, b: &Distribution) -> Result<f64> {
    chi_square_test(a, b).map(|t| t.p_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfdrift_common::{DirectlyFollowsPair, DistributionKind, EventLabel};

    fn labels(names: &[&str]) -> Vec<EventLabel> {
        names.iter().map(|n| EventLabel::from(*n)).collect()
    }

    fn df(traces: &[&[&str]]) -> Distribution {
        let mut d = Distribution::new(DistributionKind::DirectlyFollows);
        for t in traces {
            d.update_labels(&labels(t));
        }
        d
    }

    /// Activity distribution with the given label counts.
    fn activity(counts: &[(&str, usize)]) -> Distribution {
        let mut d = Distribution::new(DistributionKind::Activity);
        for (label, n) in counts {
            d.update_labels(&vec![EventLabel::from(*label); *n]);
        }
        d
    }

    #[test]
    fn test_distance_of_identical_is_zero() {
        let a = df(&[&["A", "B", "C"], &["A", "C"]]);
        assert_eq!(distance(&a, &a.clone()).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_disjoint_singletons() {
        // {A->B: 1.0} vs {C->D: 1.0}
        let a = df(&[&["A", "B"]]);
        let b = df(&[&["C", "D"]]);
        assert!((distance(&a, &b).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = df(&[&["A", "B", "A", "C"]]);
        let b = df(&[&["A", "B"], &["B", "C", "C"]]);
        let ab = distance(&a, &b).unwrap();
        let ba = distance(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_kind_mismatch() {
        let a = df(&[&["A", "B"]]);
        let b = activity(&[("A", 1)]);
        assert!(matches!(
            distance(&a, &b),
            Err(Error::TypeMismatch {
                left: DistributionKind::DirectlyFollows,
                right: DistributionKind::Activity
            })
        ));
        assert!(matches!(significance(&b, &a), Err(Error::TypeMismatch { .. })));
        assert!(comparison_rows(&a, &b).is_err());
    }

    #[test]
    fn test_alignment_is_sorted_union() {
        let mut a = FrequencyStore::<DirectlyFollowsPair>::new();
        a.update(&labels(&["B", "C", "A", "B"]));
        let mut b = FrequencyStore::<DirectlyFollowsPair>::new();
        b.update(&labels(&["A", "B", "A", "B"]));

        let aligned = aligned_counts(&a, &b);
        assert_eq!(
            aligned.keys,
            vec![
                DirectlyFollowsPair::new("A", "B"),
                DirectlyFollowsPair::new("B", "A"),
                DirectlyFollowsPair::new("B", "C"),
                DirectlyFollowsPair::new("C", "A"),
            ]
        );
        assert_eq!(aligned.left, vec![1, 0, 1, 1]);
        assert_eq!(aligned.right, vec![2, 1, 0, 0]);
    }

    #[test]
    fn test_disjoint_pairs_zero_fill() {
        let mut a = FrequencyStore::<DirectlyFollowsPair>::new();
        a.record_all([DirectlyFollowsPair::new("A", "B"), DirectlyFollowsPair::new("A", "B")]);
        let mut b = FrequencyStore::<DirectlyFollowsPair>::new();
        b.record_all(vec![DirectlyFollowsPair::new("C", "D"); 3]);

        let aligned = aligned_counts(&a, &b);
        assert_eq!(
            aligned.keys,
            vec![DirectlyFollowsPair::new("A", "B"), DirectlyFollowsPair::new("C", "D")]
        );
        assert_eq!(aligned.left, vec![2, 0]);
        assert_eq!(aligned.right, vec![0, 3]);

        let test = chi_square_test(&Distribution::DirectlyFollows(a), &Distribution::DirectlyFollows(b))
            .unwrap();
        assert!((test.statistic - 5.0).abs() < 1e-12);
        assert_eq!(test.degrees_of_freedom, 1);
        assert!((test.p_value - 0.025_347).abs() < 1e-5);
    }

    #[test]
    fn test_significance_known_values() {
        let a = activity(&[("A", 48), ("B", 22), ("C", 33), ("D", 47)]);
        let b = activity(&[("A", 35), ("B", 36), ("C", 42), ("D", 27)]);
        let test = chi_square_test(&a, &b).unwrap();
        assert!((test.statistic - 11.569_790).abs() < 1e-5);
        assert_eq!(test.degrees_of_freedom, 3);
        assert!((significance(&a, &b).unwrap() - 0.009_012).abs() < 1e-5);
    }

    #[test]
    fn test_significance_disjoint_keys() {
        let a = activity(&[("A", 2)]);
        let b = activity(&[("B", 3)]);
        let test = chi_square_test(&a, &b).unwrap();
        assert!((test.statistic - 5.0).abs() < 1e-12);
        assert_eq!(test.degrees_of_freedom, 1);
    }

    #[test]
    fn test_significance_of_self_is_one() {
        let a = activity(&[("A", 5), ("B", 7), ("C", 1)]);
        assert!((significance(&a, &a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_significance_needs_two_keys() {
        let a = activity(&[("A", 5)]);
        let b = activity(&[("A", 9)]);
        assert!(matches!(significance(&a, &b), Err(Error::InsufficientData(_))));

        let empty = Distribution::new(DistributionKind::Activity);
        let c = activity(&[("A", 1), ("B", 1)]);
        assert!(matches!(significance(&c, &empty), Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_comparison_rows() {
        let a = activity(&[("B", 1), ("A", 2)]);
        let b = activity(&[("C", 4)]);
        let rows = comparison_rows(&a, &b).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(rows[2], ComparisonRow { key: "C".into(), left: 0, right: 4 });
    }
}
