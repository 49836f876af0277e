//! Abundance table with sparse storage for lineage-by-sample data.

use crate::data::hierarchy::{build_hierarchy, HierarchyNode, LineageRow};
use crate::error::{Result, TaxocompError};
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A sparse abundance table storing per-sample values for each lineage.
///
/// Rows represent lineages (delimited taxonomic paths), columns represent
/// samples. Uses CSR format for efficient row-wise access; zero entries are
/// elided from storage but read back as `0.0`, since zero abundance is a
/// valid data point rather than missing data. Values may be fractional or
/// negative.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    /// Sparse matrix in CSR format (lineages × samples).
    data: CsMat<f64>,
    /// Lineage path strings (row names).
    lineages: Vec<String>,
    /// Sample identifiers (column names).
    sample_ids: Vec<String>,
}

impl AbundanceTable {
    /// Create a new AbundanceTable from a sparse matrix and identifiers.
    pub fn new(data: CsMat<f64>, lineages: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != lineages.len() {
            return Err(TaxocompError::DimensionMismatch {
                expected: nrows,
                actual: lineages.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(TaxocompError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            lineages,
            sample_ids,
        })
    }

    /// Load a wide-format abundance table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with sample IDs (first column is the lineage header)
    /// - Subsequent rows: lineage path followed by one value per sample
    pub fn from_wide_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| TaxocompError::EmptyData("Empty abundance table".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(TaxocompError::EmptyData(
                "Abundance table must have at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.to_string()).collect();
        let n_samples = sample_ids.len();

        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut lineages: Vec<String> = Vec::new();

        for (row_idx, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            lineages.push(fields[0].to_string());

            for (col_idx, value_str) in fields[1..].iter().enumerate() {
                if col_idx >= n_samples {
                    break;
                }
                let value: f64 =
                    value_str
                        .trim()
                        .parse()
                        .map_err(|_| TaxocompError::InvalidAbundance {
                            value: value_str.to_string(),
                            row: row_idx,
                            col: col_idx,
                        })?;
                if value != 0.0 {
                    triplets.push((lineages.len() - 1, col_idx, value));
                }
            }
        }

        if lineages.is_empty() {
            return Err(TaxocompError::EmptyData(
                "No lineages in abundance table".to_string(),
            ));
        }

        let mut tri_mat = TriMat::new((lineages.len(), n_samples));
        for (row, col, val) in triplets {
            tri_mat.add_triplet(row, col, val);
        }
        let data: CsMat<f64> = tri_mat.to_csr();

        Self::new(data, lineages, sample_ids)
    }

    /// Load a long-format abundance table from a TSV file.
    ///
    /// Expected format: a header row followed by three columns per row,
    /// `lineage<TAB>sample<TAB>value`. Lineage and sample order is
    /// first-seen order; repeated (lineage, sample) pairs accumulate.
    pub fn from_long_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        lines
            .next()
            .ok_or_else(|| TaxocompError::EmptyData("Empty abundance table".to_string()))??;

        let mut lineages: Vec<String> = Vec::new();
        let mut lineage_index: HashMap<String, usize> = HashMap::new();
        let mut sample_ids: Vec<String> = Vec::new();
        let mut sample_index: HashMap<String, usize> = HashMap::new();
        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();

        for (row_idx, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(TaxocompError::EmptyData(format!(
                    "Long-format row {} has fewer than 3 columns",
                    row_idx
                )));
            }

            let row = *lineage_index
                .entry(fields[0].to_string())
                .or_insert_with(|| {
                    lineages.push(fields[0].to_string());
                    lineages.len() - 1
                });
            let col = *sample_index
                .entry(fields[1].to_string())
                .or_insert_with(|| {
                    sample_ids.push(fields[1].to_string());
                    sample_ids.len() - 1
                });

            let value: f64 = fields[2]
                .trim()
                .parse()
                .map_err(|_| TaxocompError::InvalidAbundance {
                    value: fields[2].to_string(),
                    row: row_idx,
                    col: 2,
                })?;
            if value != 0.0 {
                triplets.push((row, col, value));
            }
        }

        if lineages.is_empty() {
            return Err(TaxocompError::EmptyData(
                "No lineages in abundance table".to_string(),
            ));
        }

        // Duplicate triplets are summed when converting to CSR.
        let mut tri_mat = TriMat::new((lineages.len(), sample_ids.len()));
        for (row, col, val) in triplets {
            tri_mat.add_triplet(row, col, val);
        }
        let data: CsMat<f64> = tri_mat.to_csr();

        Self::new(data, lineages, sample_ids)
    }

    /// Get the value at (row, col), returning 0.0 for elided entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    /// Number of lineages (rows).
    #[inline]
    pub fn n_lineages(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Lineage path strings.
    pub fn lineages(&self) -> &[String] {
        &self.lineages
    }

    /// Sample identifiers.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Convert to flat lineage rows (stored entries only).
    pub fn rows(&self) -> Vec<LineageRow> {
        self.lineages
            .iter()
            .enumerate()
            .map(|(row_idx, lineage)| {
                let abundances = self
                    .data
                    .outer_view(row_idx)
                    .map(|row| {
                        row.iter()
                            .map(|(col, &v)| (self.sample_ids[col].clone(), v))
                            .collect()
                    })
                    .unwrap_or_default();
                LineageRow {
                    lineage: lineage.clone(),
                    abundances,
                }
            })
            .collect()
    }

    /// Build the abundance hierarchy from this table's rows.
    pub fn build_hierarchy(&self, delimiter: &str) -> Result<HierarchyNode> {
        build_hierarchy(&self.rows(), delimiter)
    }
}
