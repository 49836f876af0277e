//! Pairwise comparison matrix over many sample groups.
//!
//! Every unordered pair of groups gets a fully corrected comparison set.
//! Cells are independent (pure functions over their own two groups), so
//! they are computed in parallel.

use crate::compare::builder::{compare_groups, mark_significant, ComparisonConfig};
use crate::correct::correct_comparison;
use crate::data::{ComparisonSet, HierarchyNode, SampleGroup};
use crate::error::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One cell of the pairwise matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Name of group 1 (row).
    pub group_1: String,
    /// Name of group 2 (column).
    pub group_2: String,
    /// Corrected and significance-marked statistics for the pair.
    pub stats: ComparisonSet,
}

/// All pairwise two-group comparisons over one hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    /// Group names in input order.
    pub group_names: Vec<String>,
    /// Upper-triangle cells, row-major in input group order.
    pub cells: Vec<MatrixCell>,
}

impl ComparisonMatrix {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up the cell for a pair of groups, in either orientation.
    ///
    /// The stored cell keeps its own group order; callers reading signed
    /// metrics must check `stats.group_1`/`group_2` for orientation.
    pub fn get(&self, a: &str, b: &str) -> Option<&ComparisonSet> {
        self.cells
            .iter()
            .find(|c| {
                (c.group_1 == a && c.group_2 == b) || (c.group_1 == b && c.group_2 == a)
            })
            .map(|c| &c.stats)
    }

    /// Write one summary row per cell to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "group_1\tgroup_2\tn_nodes\tn_significant")?;
        for cell in &self.cells {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                cell.group_1,
                cell.group_2,
                cell.stats.len(),
                cell.stats.n_significant()
            )?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ComparisonMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Comparison matrix: {} groups, {} pairs",
            self.group_names.len(),
            self.cells.len()
        )?;
        for cell in &self.cells {
            writeln!(
                f,
                "  {} vs {}: {} / {} significant",
                cell.group_1,
                cell.group_2,
                cell.stats.n_significant(),
                cell.stats.len()
            )?;
        }
        Ok(())
    }
}

/// Compute every pairwise comparison, each cell corrected over its own
/// full record set and marked against the configured policy.
pub fn comparison_matrix(
    tree: &HierarchyNode,
    groups: &[SampleGroup],
    config: &ComparisonConfig,
) -> Result<ComparisonMatrix> {
    if groups.len() < 2 {
        return Err(crate::error::TaxocompError::InvalidParameter(
            "Comparison matrix requires at least two groups".to_string(),
        ));
    }

    let pairs: Vec<(usize, usize)> = (0..groups.len())
        .flat_map(|i| (i + 1..groups.len()).map(move |j| (i, j)))
        .collect();

    let cells: Vec<MatrixCell> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let mut stats = compare_groups(tree, &groups[i], &groups[j], config);
            correct_comparison(&mut stats);
            mark_significant(&mut stats, &config.policy);
            MatrixCell {
                group_1: groups[i].name.clone(),
                group_2: groups[j].name.clone(),
                stats,
            }
        })
        .collect();

    Ok(ComparisonMatrix {
        group_names: groups.iter().map(|g| g.name.clone()).collect(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{build_hierarchy, LineageRow};

    fn tree_and_groups() -> (HierarchyNode, Vec<SampleGroup>) {
        let mut abundances = std::collections::HashMap::new();
        for (i, sample) in ["A1", "A2", "A3", "B1", "B2", "B3", "C1", "C2", "C3"]
            .iter()
            .enumerate()
        {
            abundances.insert(sample.to_string(), (i + 1) as f64);
        }
        let rows = vec![LineageRow {
            lineage: "k__Bacteria;p__Firmicutes".to_string(),
            abundances,
        }];
        let tree = build_hierarchy(&rows, ";").unwrap();

        let groups = ["A", "B", "C"]
            .iter()
            .map(|name| {
                SampleGroup::new(
                    *name,
                    (1..=3).map(|i| format!("{}{}", name, i)).collect(),
                )
            })
            .collect();
        (tree, groups)
    }

    #[test]
    fn test_all_pairs_present() {
        let (tree, groups) = tree_and_groups();
        let matrix = comparison_matrix(&tree, &groups, &ComparisonConfig::default()).unwrap();

        assert_eq!(matrix.len(), 3); // C(3, 2)
        assert!(matrix.get("A", "B").is_some());
        assert!(matrix.get("B", "C").is_some());
        assert!(matrix.get("A", "C").is_some());
        assert!(matrix.get("A", "D").is_none());
    }

    #[test]
    fn test_symmetric_lookup() {
        let (tree, groups) = tree_and_groups();
        let matrix = comparison_matrix(&tree, &groups, &ComparisonConfig::default()).unwrap();

        let ab = matrix.get("A", "B").unwrap();
        let ba = matrix.get("B", "A").unwrap();
        assert_eq!(ab.group_1, ba.group_1); // same underlying cell
    }

    #[test]
    fn test_cells_are_corrected() {
        let (tree, groups) = tree_and_groups();
        let matrix = comparison_matrix(&tree, &groups, &ComparisonConfig::default()).unwrap();

        for cell in &matrix.cells {
            for record in cell.stats.records.values() {
                assert!(record.q_value.is_some());
            }
        }
    }

    #[test]
    fn test_too_few_groups() {
        let (tree, groups) = tree_and_groups();
        assert!(comparison_matrix(&tree, &groups[..1], &ComparisonConfig::default()).is_err());
    }
}
