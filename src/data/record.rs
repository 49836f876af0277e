//! Per-node comparison records and the full comparison result set.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Statistics for one hierarchy node under a two-group comparison.
///
/// Sign convention for `log2_median_ratio` and `effect_size`: positive
/// means higher in group 2. All consumers rely on this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeComparison {
    /// Full ancestor path of the node (unique key).
    pub path: String,
    /// Display name of the node.
    pub name: String,
    /// Mean abundance in group 1.
    pub mean_1: f64,
    /// Mean abundance in group 2.
    pub mean_2: f64,
    /// Median abundance in group 1.
    pub median_1: f64,
    /// Median abundance in group 2.
    pub median_2: f64,
    /// Signed log2 fold-change-like metric driving visual encoding.
    pub log2_median_ratio: f64,
    /// Two-sided Wilcoxon rank-sum p-value, clamped to [1e-4, 1].
    pub p_value: f64,
    /// Benjamini-Hochberg q-value; absent until the correction pass runs.
    pub q_value: Option<f64>,
    /// Cohen's d effect size (signed).
    pub effect_size: f64,
    /// Whether the significance policy is met; false until a policy pass.
    pub significant: bool,
}

/// Full per-node statistics map for one two-group comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSet {
    /// Name of group 1.
    pub group_1: String,
    /// Name of group 2.
    pub group_2: String,
    /// Records keyed by node path.
    pub records: HashMap<String, NodeComparison>,
}

impl ComparisonSet {
    /// Create an empty set for a pair of groups.
    pub fn new(group_1: impl Into<String>, group_2: impl Into<String>) -> Self {
        Self {
            group_1: group_1.into(),
            group_2: group_2.into(),
            records: HashMap::new(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the record for a node path.
    pub fn get(&self, path: &str) -> Option<&NodeComparison> {
        self.records.get(path)
    }

    /// Records sorted by ascending p-value, ties broken by path so the
    /// order is deterministic.
    pub fn sorted_by_pvalue(&self) -> Vec<&NodeComparison> {
        let mut sorted: Vec<_> = self.records.values().collect();
        sorted.sort_by(|a, b| {
            a.p_value
                .partial_cmp(&b.p_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        sorted
    }

    /// Count records currently marked significant.
    pub fn n_significant(&self) -> usize {
        self.records.values().filter(|r| r.significant).count()
    }

    /// Summarize the set.
    pub fn summary(&self) -> ComparisonSummary {
        let qs: Vec<f64> = self.records.values().filter_map(|r| r.q_value).collect();
        ComparisonSummary {
            group_1: self.group_1.clone(),
            group_2: self.group_2.clone(),
            n_nodes: self.len(),
            n_significant: self.n_significant(),
            q_below_05: qs.iter().filter(|&&q| q < 0.05).count(),
            q_below_10: qs.iter().filter(|&&q| q < 0.10).count(),
        }
    }

    /// Write records to a TSV file, sorted by p-value.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "path\tname\tmean_1\tmean_2\tmedian_1\tmedian_2\tlog2_median_ratio\teffect_size\tp_value\tq_value\tsignificant"
        )?;

        for r in self.sorted_by_pvalue() {
            let q = r
                .q_value
                .map(|q| format!("{:.4e}", q))
                .unwrap_or_else(|| "NA".to_string());
            writeln!(
                writer,
                "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.4}\t{:.4}\t{:.4e}\t{}\t{}",
                r.path,
                r.name,
                r.mean_1,
                r.mean_2,
                r.median_1,
                r.median_2,
                r.log2_median_ratio,
                r.effect_size,
                r.p_value,
                q,
                r.significant
            )?;
        }

        Ok(())
    }

    /// Serialize the set to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Summary statistics for a comparison set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub group_1: String,
    pub group_2: String,
    pub n_nodes: usize,
    pub n_significant: usize,
    pub q_below_05: usize,
    pub q_below_10: usize,
}

impl std::fmt::Display for ComparisonSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Comparison: {} vs {}", self.group_1, self.group_2)?;
        writeln!(f, "  Nodes tested:        {}", self.n_nodes)?;
        writeln!(f, "  Significant (policy): {}", self.n_significant)?;
        writeln!(f, "  q < 0.05:            {}", self.q_below_05)?;
        writeln!(f, "  q < 0.10:            {}", self.q_below_10)?;
        Ok(())
    }
}
