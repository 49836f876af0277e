//! Bottom-up aggregation of comparison results for visual encoding.
//!
//! For each leaf, the magnitude is the absolute signed metric of its
//! record when the node passes the active filter, else 0; internal nodes
//! sum their children. Visibility propagates upward: a node has a visible
//! descendant when any child does. The aggregates are recomputed per
//! render pass and kept in side maps keyed by node path rather than
//! attached to the tree.

use crate::data::{ComparisonSet, HierarchyNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for the aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// When true, only records marked significant contribute magnitude
    /// and visibility.
    pub significant_only: bool,
    /// Number of largest-magnitude nodes eligible for labels.
    pub label_top_k: usize,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            significant_only: false,
            label_top_k: 10,
        }
    }
}

/// Aggregates for one comparison over one hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtreeAggregates {
    /// Summed absolute magnitude per node path.
    pub magnitude: HashMap<String, f64>,
    /// Whether any descendant (or the node itself, for leaves) passes the
    /// active filter, per node path.
    pub has_visible_descendant: HashMap<String, bool>,
    /// Maximum magnitude over all nodes, clamped to at least 1 so
    /// downstream scaling never divides by zero.
    pub max_magnitude: f64,
}

impl SubtreeAggregates {
    /// Magnitude for a node path; 0 for unknown paths.
    pub fn magnitude_of(&self, path: &str) -> f64 {
        self.magnitude.get(path).copied().unwrap_or(0.0)
    }

    /// Visibility for a node path; false for unknown paths.
    pub fn is_visible(&self, path: &str) -> bool {
        self.has_visible_descendant
            .get(path)
            .copied()
            .unwrap_or(false)
    }

    /// Magnitude cutoff below which labels are suppressed: the k-th
    /// largest magnitude over all nodes. `top_k == 0` disables labels.
    pub fn label_threshold(&self, top_k: usize) -> f64 {
        if top_k == 0 {
            return f64::INFINITY;
        }
        let mut magnitudes: Vec<f64> = self.magnitude.values().copied().collect();
        magnitudes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        magnitudes.get(top_k - 1).copied().unwrap_or(0.0)
    }
}

fn visit(
    node: &HierarchyNode,
    stats: &ComparisonSet,
    config: &AggregateConfig,
    out: &mut SubtreeAggregates,
) -> (f64, bool) {
    let (magnitude, visible) = if node.is_leaf() {
        match stats.get(&node.path) {
            Some(record) if !config.significant_only || record.significant => {
                (record.log2_median_ratio.abs(), true)
            }
            _ => (0.0, false),
        }
    } else {
        let mut sum = 0.0;
        let mut any_visible = false;
        for child in &node.children {
            let (child_magnitude, child_visible) = visit(child, stats, config, out);
            sum += child_magnitude;
            any_visible |= child_visible;
        }
        (sum, any_visible)
    };

    out.magnitude.insert(node.path.clone(), magnitude);
    out.has_visible_descendant.insert(node.path.clone(), visible);
    (magnitude, visible)
}

/// Run the aggregation pass over a hierarchy.
///
/// Total for any input: every node ends up with a defined magnitude and
/// visibility, and `max_magnitude >= 1` even for an empty statistics map
/// or a tree with no passing leaves (a valid "no significant results"
/// outcome, not an error).
pub fn aggregate(
    tree: &HierarchyNode,
    stats: &ComparisonSet,
    config: &AggregateConfig,
) -> SubtreeAggregates {
    let mut out = SubtreeAggregates {
        magnitude: HashMap::new(),
        has_visible_descendant: HashMap::new(),
        max_magnitude: 1.0,
    };
    visit(tree, stats, config, &mut out);

    let max = out
        .magnitude
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    out.max_magnitude = if max.is_finite() { max.max(1.0) } else { 1.0 };
    out
}

/// Paths passing the visibility filter, in pre-order.
///
/// With `significant_only` off every node passes unfiltered; with it on,
/// only nodes with a visible descendant remain. An empty result is a
/// well-formed outcome.
pub fn visible_paths(
    tree: &HierarchyNode,
    aggregates: &SubtreeAggregates,
    config: &AggregateConfig,
) -> Vec<String> {
    let mut paths = Vec::new();
    tree.walk(&mut |node| {
        if !config.significant_only || aggregates.is_visible(&node.path) {
            paths.push(node.path.clone());
        }
    });
    paths
}
