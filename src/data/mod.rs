//! Data structures for hierarchical abundance comparison.

mod groups;
mod hierarchy;
mod metadata;
mod record;
mod table;

pub use groups::{find_group, groups_from_metadata, SampleGroup};
pub use hierarchy::{build_hierarchy, parse_label, HierarchyNode, LineageRow, Rank, TreeSummary};
pub use metadata::Metadata;
pub use record::{ComparisonSet, ComparisonSummary, NodeComparison};
pub use table::AbundanceTable;
