//! Statistical hypothesis testing and effect sizes.

pub mod descriptive;

pub use descriptive::{finite_values, mean, median};
pub use effect::{cohens_d, cohens_d_with, Moments, SampleMoments};
pub use ranksum::{mann_whitney_u, wilcoxon_test};
