use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Cell spellings treated as a missing value.
const NA_TOKENS: &[&str] = &["", "na", "n/a", "#n/a", "nan", "null", "none", "-"];

/// Row-oriented table with named columns, as loaded from a spreadsheet export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from a header row and data rows.
    /// Short rows are padded with empty cells so every row has one cell per header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Raw text cells of one column.
    pub fn text_column(&self, name: &str) -> Result<Vec<&str>, AnalysisError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Extract one column as floating-point values.
    ///
    /// Empty and NA cells become `NaN`; any other non-numeric cell is an error.
    pub fn extract_column(&self, name: &str) -> Result<Vec<f64>, AnalysisError> {
        if name.trim().is_empty() {
            return Err(AnalysisError::InvalidData(
                "Column name must be a non-empty string".to_string(),
            ));
        }
        if self.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "Table is empty, cannot extract '{}'",
                name
            )));
        }

        self.text_column(name)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                parse_cell(cell).ok_or_else(|| {
                    AnalysisError::InvalidData(format!(
                        "Column '{}' row {} is not numeric: '{}'",
                        name, row, cell
                    ))
                })
            })
            .collect()
    }

    /// Keep the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// Parse a numeric cell. Accepts thousands separators; NA spellings map to `NaN`.
fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if NA_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        return Some(f64::NAN);
    }
    trimmed.replace(',', "").parse::<f64>().ok()
}
