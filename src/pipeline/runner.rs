//! Pipeline runner composing comparison, correction, and aggregation.

use crate::aggregate::{aggregate, AggregateConfig, SubtreeAggregates};
use crate::compare::{
    compare_groups, comparison_matrix, mark_significant, ComparisonConfig, ComparisonMatrix,
};
use crate::correct::correct_comparison;
use crate::data::{ComparisonSet, HierarchyNode, SampleGroup};
use crate::error::{Result, TaxocompError};
use serde::{Deserialize, Serialize};

/// Options for a full comparison run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Comparison and significance configuration.
    pub comparison: ComparisonConfig,
    /// Aggregation configuration.
    pub aggregate: AggregateConfig,
}

impl PipelineOptions {
    /// Load from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(TaxocompError::from)
    }

    /// Save to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TaxocompError::from)
    }
}

/// Result of a full comparison run: the corrected per-node statistics map
/// plus the renderable aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub stats: ComparisonSet,
    pub aggregates: SubtreeAggregates,
}

/// Run a full two-group comparison in the fixed order: build per-node
/// records, BH-correct once over the complete set, mark significance,
/// then aggregate.
pub fn run_comparison(
    tree: &HierarchyNode,
    group_1: &SampleGroup,
    group_2: &SampleGroup,
    options: &PipelineOptions,
) -> Result<ComparisonOutcome> {
    for group in [group_1, group_2] {
        if group.is_empty() {
            return Err(TaxocompError::InvalidParameter(format!(
                "Sample group '{}' has no samples",
                group.name
            )));
        }
    }

    let mut stats = compare_groups(tree, group_1, group_2, &options.comparison);
    correct_comparison(&mut stats);
    mark_significant(&mut stats, &options.comparison.policy);
    let aggregates = aggregate(tree, &stats, &options.aggregate);

    Ok(ComparisonOutcome { stats, aggregates })
}

/// Run every pairwise comparison over the given groups.
pub fn run_matrix(
    tree: &HierarchyNode,
    groups: &[SampleGroup],
    options: &PipelineOptions,
) -> Result<ComparisonMatrix> {
    if let Some(empty) = groups.iter().find(|g| g.is_empty()) {
        return Err(TaxocompError::InvalidParameter(format!(
            "Sample group '{}' has no samples",
            empty.name
        )));
    }
    comparison_matrix(tree, groups, &options.comparison)
}
