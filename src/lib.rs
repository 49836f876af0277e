//! Statistical two-group comparison engine for hierarchical abundance data.
//!
//! This library builds a hierarchy from delimited lineage paths (taxonomic
//! or taxon+function), compares two named sample groups at every node with
//! a nonparametric rank-sum test, corrects across the tree for multiple
//! testing, and aggregates signed magnitudes bottom-up for visual
//! encoding. Rendering (layout, color, SVG) is a consumer of the output
//! maps, not part of this crate.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (AbundanceTable, HierarchyNode,
//!   Metadata, SampleGroup, ComparisonSet)
//! - **test**: Hypothesis testing and effect sizes (Wilcoxon rank-sum,
//!   Cohen's d)
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **compare**: Per-node group comparison and the pairwise matrix
//! - **aggregate**: Bottom-up magnitude aggregation and visibility
//!   filtering
//! - **pipeline**: Composition of a full comparison run
//!
//! # Example
//!
//! ```no_run
//! use taxocomp::prelude::*;
//!
//! // Load data
//! let table = AbundanceTable::from_wide_tsv("abundance.tsv").unwrap();
//! let metadata = Metadata::from_tsv("metadata.tsv").unwrap();
//!
//! // Build the hierarchy and derive groups
//! let tree = table.build_hierarchy(";").unwrap();
//! let groups = groups_from_metadata(&metadata, "group").unwrap();
//!
//! // Run the comparison
//! let outcome = run_comparison(
//!     &tree,
//!     find_group(&groups, "control").unwrap(),
//!     find_group(&groups, "treatment").unwrap(),
//!     &PipelineOptions::default(),
//! )
//! .unwrap();
//! println!("{}", outcome.stats.summary());
//! ```

pub mod aggregate;
pub mod compare;
pub mod correct;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aggregate::{
        aggregate, visible_paths, AggregateConfig, SubtreeAggregates,
    };
    pub use crate::compare::{
        compare_groups, comparison_matrix, mark_significant, ComparisonConfig,
        ComparisonMatrix, MatrixCell, SignificancePolicy,
    };
    pub use crate::correct::{correct_bh, correct_comparison, BhCorrected};
    pub use crate::data::{
        build_hierarchy, find_group, groups_from_metadata, AbundanceTable, ComparisonSet,
        ComparisonSummary, HierarchyNode, LineageRow, Metadata, NodeComparison, Rank,
        SampleGroup, TreeSummary,
    };
    pub use crate::error::{Result, TaxocompError};
    pub use crate::pipeline::{run_comparison, run_matrix, ComparisonOutcome, PipelineOptions};
    pub use crate::test::{cohens_d, cohens_d_with, mann_whitney_u, wilcoxon_test};
}
