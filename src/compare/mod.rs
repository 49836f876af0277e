//! Two-group comparison over a hierarchy.

pub mod builder;
pub mod matrix;

pub use builder::{
    compare_groups, mark_significant, ComparisonConfig, SignificancePolicy,
};
pub use matrix::{comparison_matrix, ComparisonMatrix, MatrixCell};
