//! Named sample groups for two-group comparison.

use crate::data::Metadata;
use crate::error::{Result, TaxocompError};
use serde::{Deserialize, Serialize};

/// A named set of sample identifiers.
///
/// The comparison engine operates on whatever two lists it receives;
/// disjointness between groups is the caller's intent, not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleGroup {
    /// Group name (e.g. the metadata category value).
    pub name: String,
    /// Sample identifiers in metadata row order.
    pub samples: Vec<String>,
}

impl SampleGroup {
    /// Create a new group.
    pub fn new(name: impl Into<String>, samples: Vec<String>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the group has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Derive sample groups from a metadata column: one group per distinct
/// value, in first-seen order. Samples with a missing value are skipped.
pub fn groups_from_metadata(metadata: &Metadata, column: &str) -> Result<Vec<SampleGroup>> {
    let mut groups: Vec<SampleGroup> = Vec::new();
    for (sample_id, value) in metadata.column(column)? {
        match groups.iter_mut().find(|g| g.name == value) {
            Some(group) => group.samples.push(sample_id.to_string()),
            None => groups.push(SampleGroup::new(value, vec![sample_id.to_string()])),
        }
    }
    Ok(groups)
}

/// Look up a group by name.
pub fn find_group<'a>(groups: &'a [SampleGroup], name: &str) -> Result<&'a SampleGroup> {
    groups
        .iter()
        .find(|g| g.name == name)
        .ok_or_else(|| TaxocompError::UnknownGroup(name.to_string()))
}
