//! In-memory data frame loaded from CSV.
//!
//! # CSV Format
//!
//! The first record is the header. Rows shorter than the header are padded
//! with missing cells; longer rows are an error. Cells are trimmed.
//!
//! ```text
//! wave,age_group,trust
//! 1,18-29,4
//! 2,NA,3
//! ```

use crate::error::{DataError, Result};
use crate::filter::Filter;
use std::path::Path;

const NA_TOKENS: [&str; 5] = ["", "NA", "N/A", "NaN", "null"];

/// Whether a raw cell string denotes a missing value.
pub fn is_na_token(raw: &str) -> bool {
    NA_TOKENS.contains(&raw)
}

fn parse_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_na_token(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Column-named table of optional string cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl DataFrame {
    /// Build a frame from already-parsed rows. Every row must match the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    row: i + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a frame from string literals, applying the same NA rules as CSV input.
    pub fn from_records(columns: &[&str], records: &[&[&str]]) -> Result<Self> {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = records
            .iter()
            .map(|r| r.iter().map(|cell| parse_cell(cell)).collect())
            .collect();
        Self::new(columns, rows)
    }

    /// Parse CSV text (with a header row).
    pub fn from_csv_str(csv_data: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            if record.len() > columns.len() {
                return Err(DataError::RaggedRow {
                    row: i + 1,
                    expected: columns.len(),
                    found: record.len(),
                });
            }
            let mut row: Vec<Option<String>> = record.iter().map(parse_cell).collect();
            row.resize(columns.len(), None);
            rows.push(row);
        }
        log::debug!("data: parsed {} rows x {} columns", rows.len(), columns.len());
        Ok(Self { columns, rows })
    }

    /// Read and parse a CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_str(&text)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DataError::UnknownColumn {
                column: name.to_string(),
                available: self.columns.join(", "),
            })
    }

    /// Fail on the first name that is not a column.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.column_index(name)?;
        }
        Ok(())
    }

    /// Cell values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Parse a column as numbers. Missing cells stay `None`; any other
    /// non-numeric value is an error.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .map(|r| match r[idx].as_deref() {
                None => Ok(None),
                Some(v) => v.parse::<f64>().map(Some).map_err(|_| DataError::NonNumeric {
                    column: name.to_string(),
                    value: v.to_string(),
                }),
            })
            .collect()
    }

    /// True if every present value in the column parses as a number.
    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric(name).is_ok()
    }

    /// Rows matching a filter, as a new frame.
    pub fn filter(&self, filter: &Filter) -> Result<DataFrame> {
        let idx = self.column_index(&filter.column)?;
        let mut rows = Vec::new();
        for row in &self.rows {
            if filter.matches(row[idx].as_deref())? {
                rows.push(row.clone());
            }
        }
        Ok(DataFrame {
            columns: self.columns.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_csv_str_reads_header_and_na_tokens() {
        let csv = "\
wave,age_group,trust
1,18-29,4
2,NA,3
3,,N/A
";
        let df = DataFrame::from_csv_str(csv).unwrap();
        assert_eq!(df.columns(), &["wave", "age_group", "trust"]);
        assert_eq!(df.len(), 3);
        assert_eq!(
            df.column("age_group").unwrap(),
            vec![Some("18-29"), None, None]
        );
        assert_eq!(df.numeric("trust").unwrap(), vec![Some(4.0), Some(3.0), None]);
    }

    #[test]
    fn short_rows_are_padded() {
        let df = DataFrame::from_csv_str("a,b,c\n1,2\n").unwrap();
        assert_eq!(df.column("c").unwrap(), vec![None]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let err = DataFrame::from_csv_str("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, DataError::RaggedRow { found: 3, .. }));
    }

    #[test]
    fn unknown_column_lists_available() {
        let df = DataFrame::from_records(&["x", "y"], &[&["a", "1"]]).unwrap();
        let err = df.require_columns(&["x", "z"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'z'"), "{}", msg);
        assert!(msg.contains("x, y"), "{}", msg);
    }

    #[test]
    fn numeric_rejects_text_values() {
        let df = DataFrame::from_records(&["score"], &[&["1"], &["high"]]).unwrap();
        let err = df.numeric("score").unwrap_err();
        assert!(matches!(err, DataError::NonNumeric { ref value, .. } if value == "high"));
        assert!(!df.is_numeric("score"));
    }

    #[test]
    fn filter_keeps_matching_rows() {
        let df = DataFrame::from_records(
            &["wave", "answer"],
            &[&["1", "yes"], &["2", "no"], &["1", "no"], &["NA", "yes"]],
        )
        .unwrap();
        let only_wave_one = df.filter(&Filter::eq("wave", "1")).unwrap();
        assert_eq!(only_wave_one.len(), 2);
        assert_eq!(
            only_wave_one.column("answer").unwrap(),
            vec![Some("yes"), Some("no")]
        );
    }

    #[test]
    fn from_csv_path_reports_missing_file() {
        let err = DataFrame::from_csv_path("/nonexistent/dashboardr/data.csv").unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
