//! Per-node two-group comparison over a hierarchy.
//!
//! Walks every node of the hierarchy exactly once, extracts the per-sample
//! abundance vectors for the two groups, and produces one statistics record
//! per node keyed by its full ancestor path. Node computations are
//! independent (pure functions over the node's own two value vectors), so
//! they run in parallel.
//!
//! The caller-level order for a full comparison is fixed: build records,
//! apply BH correction once over the whole set, then mark significance.

use crate::data::{ComparisonSet, HierarchyNode, NodeComparison, SampleGroup};
use crate::test::{cohens_d, mean, median, wilcoxon_test};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Thresholds deciding whether a record counts as significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificancePolicy {
    /// Raw p-value must be below this.
    pub max_p: f64,
    /// When set, the q-value must be present and below this.
    pub max_q: Option<f64>,
}

impl Default for SignificancePolicy {
    fn default() -> Self {
        Self {
            max_p: 0.05,
            max_q: None,
        }
    }
}

impl SignificancePolicy {
    /// Check a record against the thresholds.
    pub fn is_met(&self, record: &NodeComparison) -> bool {
        if record.p_value >= self.max_p {
            return false;
        }
        match self.max_q {
            Some(max_q) => record.q_value.map_or(false, |q| q < max_q),
            None => true,
        }
    }
}

/// Configuration for a two-group comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Pseudocount added to both medians in the log2 ratio, so
    /// zero-abundance groups stay finite.
    pub ratio_epsilon: f64,
    /// Significance thresholds applied after correction.
    pub policy: SignificancePolicy,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            ratio_epsilon: 1e-9,
            policy: SignificancePolicy::default(),
        }
    }
}

/// Per-sample abundance vector for a group at one node. Samples absent
/// from the node's map contribute 0.0: zero abundance is a valid data
/// point, not missing data.
fn group_values(node: &HierarchyNode, group: &SampleGroup) -> Vec<f64> {
    group
        .samples
        .iter()
        .map(|s| node.abundances.get(s).copied().unwrap_or(0.0))
        .collect()
}

/// Signed log2 ratio of group medians, positive when group 2 is higher.
/// Non-finite results (e.g. negative medians) collapse to 0.0.
fn log2_median_ratio(median_1: f64, median_2: f64, epsilon: f64) -> f64 {
    let ratio = ((median_2 + epsilon) / (median_1 + epsilon)).log2();
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

fn build_record(
    node: &HierarchyNode,
    group_1: &SampleGroup,
    group_2: &SampleGroup,
    config: &ComparisonConfig,
) -> NodeComparison {
    let values_1 = group_values(node, group_1);
    let values_2 = group_values(node, group_2);

    let median_1 = median(&values_1);
    let median_2 = median(&values_2);

    NodeComparison {
        path: node.path.clone(),
        name: node.name.clone(),
        mean_1: mean(&values_1),
        mean_2: mean(&values_2),
        median_1,
        median_2,
        log2_median_ratio: log2_median_ratio(median_1, median_2, config.ratio_epsilon),
        p_value: wilcoxon_test(&values_1, &values_2),
        q_value: None,
        effect_size: cohens_d(&values_1, &values_2),
        significant: false,
    }
}

/// Compare two sample groups over every node of a hierarchy.
///
/// Returns one record per node, keyed by full ancestor path (display names
/// collide across branches, paths do not). Records carry no q-value and no
/// significance flag yet; see [`crate::correct::correct_comparison`] and
/// [`mark_significant`].
pub fn compare_groups(
    tree: &HierarchyNode,
    group_1: &SampleGroup,
    group_2: &SampleGroup,
    config: &ComparisonConfig,
) -> ComparisonSet {
    let nodes = tree.nodes();
    let records: HashMap<String, NodeComparison> = nodes
        .par_iter()
        .map(|&node| {
            (
                node.path.clone(),
                build_record(node, group_1, group_2, config),
            )
        })
        .collect();

    ComparisonSet {
        group_1: group_1.name.clone(),
        group_2: group_2.name.clone(),
        records,
    }
}

/// Apply a significance policy to every record in a set.
pub fn mark_significant(set: &mut ComparisonSet, policy: &SignificancePolicy) {
    for record in set.records.values_mut() {
        record.significant = policy.is_met(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{build_hierarchy, LineageRow};
    use approx::assert_relative_eq;

    fn row(lineage: &str, values: &[(&str, f64)]) -> LineageRow {
        LineageRow {
            lineage: lineage.to_string(),
            abundances: values
                .iter()
                .map(|(s, v)| (s.to_string(), *v))
                .collect(),
        }
    }

    fn groups() -> (SampleGroup, SampleGroup) {
        (
            SampleGroup::new(
                "control",
                vec!["C1".into(), "C2".into(), "C3".into(), "C4".into()],
            ),
            SampleGroup::new(
                "treatment",
                vec!["T1".into(), "T2".into(), "T3".into(), "T4".into()],
            ),
        )
    }

    fn test_tree() -> HierarchyNode {
        let rows = vec![
            // Higher in treatment. 4v4 on the exact branch: a clean
            // separation gives p = 2 / C(8, 4) ~= 0.029.
            row(
                "k__Bacteria;p__Firmicutes",
                &[
                    ("C1", 1.0),
                    ("C2", 2.0),
                    ("C3", 1.5),
                    ("C4", 1.2),
                    ("T1", 10.0),
                    ("T2", 12.0),
                    ("T3", 11.0),
                    ("T4", 10.5),
                ],
            ),
            // Present only in controls.
            row(
                "k__Bacteria;p__Bacteroidetes",
                &[("C1", 5.0), ("C2", 6.0), ("C3", 4.0), ("C4", 5.5)],
            ),
        ];
        build_hierarchy(&rows, ";").unwrap()
    }

    #[test]
    fn test_record_per_node_keyed_by_path() {
        let (g1, g2) = groups();
        let set = compare_groups(&test_tree(), &g1, &g2, &ComparisonConfig::default());

        // root, k__Bacteria, and the two phyla.
        assert_eq!(set.len(), 4);
        assert!(set.get("k__Bacteria;p__Firmicutes").is_some());
        assert!(set.get("root").is_some());
        assert_eq!(set.group_1, "control");
        assert_eq!(set.group_2, "treatment");
    }

    #[test]
    fn test_descriptives_and_sign() {
        let (g1, g2) = groups();
        let set = compare_groups(&test_tree(), &g1, &g2, &ComparisonConfig::default());

        let r = set.get("k__Bacteria;p__Firmicutes").unwrap();
        assert_relative_eq!(r.mean_1, 1.425);
        assert_relative_eq!(r.mean_2, 10.875);
        assert_relative_eq!(r.median_1, 1.35);
        assert_relative_eq!(r.median_2, 10.75);
        // Higher in group 2 => positive ratio and positive effect size.
        assert!(r.log2_median_ratio > 0.0);
        assert!(r.effect_size > 0.0);
        assert!(r.p_value < 0.05);
        assert!(r.q_value.is_none(), "q-value absent before correction");

        // Absent in treatment => treatment samples read 0.0, ratio negative.
        let r = set.get("k__Bacteria;p__Bacteroidetes").unwrap();
        assert_relative_eq!(r.median_2, 0.0);
        assert!(r.log2_median_ratio < 0.0);
        assert!(r.effect_size < 0.0);
    }

    #[test]
    fn test_zero_abundance_node_gets_zero_record() {
        // A node with no abundance in either group still produces a record
        // with value 0, by design.
        let rows = vec![
            row("k__A", &[("X1", 1.0)]),
            row("k__B", &[("C1", 1.0), ("T1", 2.0)]),
        ];
        let tree = build_hierarchy(&rows, ";").unwrap();
        let g1 = SampleGroup::new("c", vec!["C1".into()]);
        let g2 = SampleGroup::new("t", vec!["T1".into()]);
        let set = compare_groups(&tree, &g1, &g2, &ComparisonConfig::default());

        let r = set.get("k__A").unwrap();
        assert_eq!(r.mean_1, 0.0);
        assert_eq!(r.mean_2, 0.0);
        assert_eq!(r.log2_median_ratio, 0.0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_policy_p_only() {
        let policy = SignificancePolicy::default();
        let (g1, g2) = groups();
        let mut set = compare_groups(&test_tree(), &g1, &g2, &ComparisonConfig::default());
        mark_significant(&mut set, &policy);

        assert!(set.get("k__Bacteria;p__Firmicutes").unwrap().significant);
        // Root sums are also cleanly separated here.
        assert!(set.get("root").unwrap().significant);
    }

    #[test]
    fn test_policy_requires_q_when_configured() {
        let policy = SignificancePolicy {
            max_p: 0.05,
            max_q: Some(0.1),
        };
        let record = NodeComparison {
            path: "x".into(),
            name: "x".into(),
            mean_1: 0.0,
            mean_2: 0.0,
            median_1: 0.0,
            median_2: 0.0,
            log2_median_ratio: 0.0,
            p_value: 0.01,
            q_value: None,
            effect_size: 0.0,
            significant: false,
        };
        // q threshold configured but no q-value present: not significant.
        assert!(!policy.is_met(&record));
        let mut with_q = record.clone();
        with_q.q_value = Some(0.05);
        assert!(policy.is_met(&with_q));
        with_q.q_value = Some(0.5);
        assert!(!policy.is_met(&with_q));
    }

    #[test]
    fn test_log2_ratio_epsilon() {
        // Zero medians stay finite through the pseudocount.
        assert_eq!(log2_median_ratio(0.0, 0.0, 1e-9), 0.0);
        assert!(log2_median_ratio(0.0, 4.0, 1e-9) > 20.0);
        assert!(log2_median_ratio(4.0, 0.0, 1e-9) < -20.0);
        // Negative medians would go non-finite; collapse to 0.
        assert_eq!(log2_median_ratio(-2.0, 3.0, 1e-9), 0.0);
    }
}
