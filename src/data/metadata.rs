//! Sample metadata handling for group assignment.

use crate::error::{Result, TaxocompError};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sample metadata: one row per sample, string-valued columns.
///
/// Empty cells and `NA`/`na` are treated as missing and elided. Group
/// assignment only needs categorical values, so columns are kept as raw
/// strings rather than typed variables.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Sample IDs in row order.
    sample_ids: Vec<String>,
    /// Column names in header order.
    column_names: Vec<String>,
    /// sample_id -> column_name -> value (missing entries absent).
    data: HashMap<String, HashMap<String, String>>,
}

impl Metadata {
    /// Load metadata from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is sample ID)
    /// - Subsequent rows: sample ID followed by values
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| TaxocompError::EmptyData("Empty metadata file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(TaxocompError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].iter().map(|s| s.to_string()).collect();

        let mut sample_ids = Vec::new();
        let mut data = HashMap::new();

        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let sample_id = fields[0].to_string();

            let mut sample_data = HashMap::new();
            for (col_idx, col_name) in column_names.iter().enumerate() {
                let raw = fields.get(col_idx + 1).map(|s| s.trim()).unwrap_or("");
                if raw.is_empty() || raw == "NA" || raw == "na" {
                    continue;
                }
                sample_data.insert(col_name.clone(), raw.to_string());
            }
            sample_ids.push(sample_id.clone());
            data.insert(sample_id, sample_data);
        }

        if sample_ids.is_empty() {
            return Err(TaxocompError::EmptyData(
                "No samples in metadata".to_string(),
            ));
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
        })
    }

    /// Sample IDs in row order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names in header order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get a value for a sample/column pair, if present.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&str> {
        self.data
            .get(sample_id)
            .and_then(|row| row.get(column))
            .map(|s| s.as_str())
    }

    /// Values of one column in sample order, erroring if the column is
    /// absent from the header. Samples with a missing value are skipped.
    pub fn column(&self, column: &str) -> Result<Vec<(&str, &str)>> {
        if !self.column_names.iter().any(|c| c == column) {
            return Err(TaxocompError::MissingColumn(column.to_string()));
        }
        Ok(self
            .sample_ids
            .iter()
            .filter_map(|id| self.get(id, column).map(|v| (id.as_str(), v)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tgroup\tsite").unwrap();
        writeln!(file, "S1\tcontrol\tgut").unwrap();
        writeln!(file, "S2\tcontrol\tNA").unwrap();
        writeln!(file, "S3\ttreatment\tskin").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_from_tsv() {
        let file = fixture();
        let metadata = Metadata::from_tsv(file.path()).unwrap();

        assert_eq!(metadata.sample_ids(), &["S1", "S2", "S3"]);
        assert_eq!(metadata.get("S1", "group"), Some("control"));
        assert_eq!(metadata.get("S2", "site"), None); // NA is missing
    }

    #[test]
    fn test_column() {
        let file = fixture();
        let metadata = Metadata::from_tsv(file.path()).unwrap();

        let groups = metadata.column("group").unwrap();
        assert_eq!(groups.len(), 3);
        let sites = metadata.column("site").unwrap();
        assert_eq!(sites.len(), 2); // S2 skipped
    }

    #[test]
    fn test_missing_column() {
        let file = fixture();
        let metadata = Metadata::from_tsv(file.path()).unwrap();

        let err = metadata.column("nonexistent").unwrap_err();
        assert!(matches!(err, TaxocompError::MissingColumn(_)));
    }
}
