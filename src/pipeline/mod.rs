//! Composition and execution of full comparisons.

mod runner;

pub use runner::{run_comparison, run_matrix, ComparisonOutcome, PipelineOptions};
