//! Benjamini-Hochberg false discovery rate correction.

use crate::data::ComparisonSet;
use serde::{Deserialize, Serialize};

/// Result of BH correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhCorrected {
    /// Node paths in original order.
    pub keys: Vec<String>,
    /// Original p-values.
    pub p_values: Vec<f64>,
    /// Adjusted p-values (q-values).
    pub q_values: Vec<f64>,
    /// Number of tests.
    pub n_tests: usize,
}

impl BhCorrected {
    /// Get the q-value for a specific key.
    pub fn get_qvalue(&self, key: &str) -> Option<f64> {
        let idx = self.keys.iter().position(|k| k == key)?;
        self.q_values.get(idx).copied()
    }

    /// Count significant results at a threshold.
    pub fn n_significant(&self, alpha: f64) -> usize {
        self.q_values.iter().filter(|&&q| q < alpha).count()
    }

    /// Keys of significant results at a threshold.
    pub fn significant_keys(&self, alpha: f64) -> Vec<&str> {
        self.keys
            .iter()
            .zip(&self.q_values)
            .filter(|(_, &q)| q < alpha)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Apply Benjamini-Hochberg FDR correction.
///
/// The step-up procedure controls the false discovery rate: for rank `i`
/// (1-indexed from the smallest p-value),
/// `q[i] = min(p[i] * n / i, q[i+1])`, seeded with 1 for the largest
/// p-value and clamped to 1. Iterating from the largest p-value down,
/// q-values are monotone non-increasing by construction.
///
/// # Arguments
/// * `p_values` - Raw p-values
/// * `keys` - Node paths (same order as p_values)
pub fn correct_bh(p_values: &[f64], keys: &[String]) -> BhCorrected {
    let n = p_values.len();
    if n == 0 {
        return BhCorrected {
            keys: vec![],
            p_values: vec![],
            q_values: vec![],
            n_tests: 0,
        };
    }

    // Sorted index, ties broken by key for a deterministic order.
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| keys[a].cmp(&keys[b]))
    });

    let mut q_sorted = vec![0.0; n];
    let n_f64 = n as f64;

    // Start from the largest p-value and work backwards.
    q_sorted[n - 1] = p_values[indices[n - 1]].min(1.0);
    for i in (0..n - 1).rev() {
        let rank = i + 1;
        let adjusted = p_values[indices[i]] * n_f64 / rank as f64;
        q_sorted[i] = adjusted.min(q_sorted[i + 1]).min(1.0);
    }

    // Restore original order.
    let mut q_values = vec![0.0; n];
    for (i, &orig_idx) in indices.iter().enumerate() {
        q_values[orig_idx] = q_sorted[i];
    }

    BhCorrected {
        keys: keys.to_vec(),
        p_values: p_values.to_vec(),
        q_values,
        n_tests: n,
    }
}

/// Apply BH correction across a full comparison set, writing a `q_value`
/// into every record.
///
/// Correction is a batch operation over the complete per-tree collection:
/// it must run once per comparison, never per node, and always over the
/// full set rather than a visibility-filtered subset (re-scoping would
/// change q-values depending on which nodes are currently shown).
pub fn correct_comparison(set: &mut ComparisonSet) -> BhCorrected {
    let mut keys: Vec<String> = set.records.keys().cloned().collect();
    keys.sort();
    let p_values: Vec<f64> = keys
        .iter()
        .map(|k| set.records[k].p_value)
        .collect();

    let corrected = correct_bh(&p_values, &keys);
    for (key, &q) in corrected.keys.iter().zip(&corrected.q_values) {
        if let Some(record) = set.records.get_mut(key) {
            record.q_value = Some(q);
        }
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NodeComparison;
    use approx::assert_relative_eq;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("node_{}", i)).collect()
    }

    #[test]
    fn test_bh_known_values() {
        // 5 tests, p = [0.01, 0.02, 0.03, 0.04, 0.20]:
        // Rank 1: 0.01 * 5/1 = 0.05, min with next = 0.05
        // Rank 2: 0.02 * 5/2 = 0.05
        // Rank 3: 0.03 * 5/3 = 0.05
        // Rank 4: 0.04 * 5/4 = 0.05
        // Rank 5: 0.20 * 5/5 = 0.20
        let p_values = vec![0.01, 0.02, 0.03, 0.04, 0.20];
        let corrected = correct_bh(&p_values, &keys(5));

        assert_relative_eq!(corrected.q_values[0], 0.05, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[1], 0.05, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[2], 0.05, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[3], 0.05, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[4], 0.20, epsilon = 1e-10);

        // Smallest p-value's q equals min(p*n/1, q of rank 2).
        let raw: f64 = 0.01 * 5.0 / 1.0;
        assert_relative_eq!(
            corrected.q_values[0],
            raw.min(corrected.q_values[1]),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_bh_ordering() {
        // P-values in non-sorted input order.
        let p_values = vec![0.04, 0.01, 0.03, 0.005];
        let corrected = correct_bh(&p_values, &keys(4));

        // Smallest p-value (0.005 at index 3): q = 0.005 * 4 / 1 = 0.02.
        assert_relative_eq!(corrected.q_values[3], 0.02, epsilon = 1e-10);
        // Second smallest (0.01 at index 1): min(0.01 * 4/2, next) = 0.02.
        assert_relative_eq!(corrected.q_values[1], 0.02, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_monotone_in_pvalue_order() {
        let p_values = vec![0.001, 0.01, 0.02, 0.05, 0.1, 0.5];
        let corrected = correct_bh(&p_values, &keys(6));

        // Sorted by ascending p-value, q-values never decrease.
        let mut prev = 0.0;
        for q in &corrected.q_values {
            assert!(*q >= prev - 1e-12);
            prev = *q;
        }
    }

    #[test]
    fn test_bh_bounded() {
        let p_values = vec![0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
        let corrected = correct_bh(&p_values, &keys(6));
        for q in &corrected.q_values {
            assert!(*q <= 1.0);
        }
    }

    #[test]
    fn test_bh_empty() {
        let corrected = correct_bh(&[], &[]);
        assert_eq!(corrected.n_tests, 0);
        assert!(corrected.q_values.is_empty());
    }

    #[test]
    fn test_bh_single() {
        let corrected = correct_bh(&[0.05], &keys(1));
        assert_eq!(corrected.n_tests, 1);
        assert_relative_eq!(corrected.q_values[0], 0.05, epsilon = 1e-10);
    }

    #[test]
    fn test_n_significant() {
        let p_values = vec![0.001, 0.01, 0.03, 0.1, 0.5];
        let corrected = correct_bh(&p_values, &keys(5));

        assert!(corrected.n_significant(0.01) <= corrected.n_significant(0.05));
        assert!(corrected.n_significant(0.05) <= corrected.n_significant(0.10));
    }

    fn record(path: &str, p: f64) -> NodeComparison {
        NodeComparison {
            path: path.to_string(),
            name: path.to_string(),
            mean_1: 0.0,
            mean_2: 0.0,
            median_1: 0.0,
            median_2: 0.0,
            log2_median_ratio: 0.0,
            p_value: p,
            q_value: None,
            effect_size: 0.0,
            significant: false,
        }
    }

    #[test]
    fn test_correct_comparison_writes_qvalues() {
        let mut set = ComparisonSet::new("a", "b");
        for (path, p) in [("x", 0.01), ("y", 0.02), ("z", 0.9)] {
            set.records.insert(path.to_string(), record(path, p));
        }

        let corrected = correct_comparison(&mut set);
        assert_eq!(corrected.n_tests, 3);
        for r in set.records.values() {
            let q = r.q_value.expect("q-value must be filled in");
            assert!(q <= 1.0);
        }
        assert_relative_eq!(
            set.get("x").unwrap().q_value.unwrap(),
            corrected.get_qvalue("x").unwrap()
        );
    }
}
