//! data-loader: statement tables from a CSV file or a Google Sheets export.
//!
//! A location is either an `http(s)://` URL, a local path, or a bare sheet id
//! (see [`TableLocation::sheet`]).

use std::path::PathBuf;
use std::time::Duration;

use analysis_core::{AnalysisError, Table, TableSource};
use async_trait::async_trait;
use reqwest::Client;

const SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Spreadsheet holding the default company's statement history.
pub const DEFAULT_SHEET_ID: &str = "18FqhJ8iB6AZwbjUjGWFiWPBiPebjigGIwAvmmQDd1FA";

/// CSV export endpoint for a Google Sheets document.
pub fn sheet_export_url(sheet_id: &str) -> String {
    format!("{}/{}/export?format=csv", SHEETS_BASE_URL, sheet_id.trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLocation {
    Remote(String),
    Local(PathBuf),
}

impl TableLocation {
    /// URLs are fetched over HTTP, anything else is a local path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            TableLocation::Remote(location.to_string())
        } else {
            TableLocation::Local(PathBuf::from(location))
        }
    }

    pub fn sheet(sheet_id: &str) -> Self {
        TableLocation::Remote(sheet_export_url(sheet_id))
    }
}

impl std::fmt::Display for TableLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableLocation::Remote(url) => write!(f, "{}", url),
            TableLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse CSV text with a header row into a [`Table`].
pub fn parse_csv(data: &str) -> Result<Table, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AnalysisError::SourceError(format!("Invalid CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(AnalysisError::SourceError("CSV has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AnalysisError::SourceError(format!("Invalid CSV record {}: {}", i + 1, e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(AnalysisError::SourceError("CSV has no data rows".to_string()));
    }
    Ok(Table::new(headers, rows))
}

#[derive(Clone)]
pub struct CsvTableSource {
    location: TableLocation,
    client: Client,
}

impl CsvTableSource {
    pub fn new(location: TableLocation) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { location, client }
    }

    async fn fetch_text(&self) -> Result<String, AnalysisError> {
        match &self.location {
            TableLocation::Remote(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| AnalysisError::SourceError(format!("GET {}: {}", url, e)))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(AnalysisError::SourceError(format!(
                        "GET {} returned {}",
                        url, status
                    )));
                }
                response
                    .text()
                    .await
                    .map_err(|e| AnalysisError::SourceError(format!("Reading {}: {}", url, e)))
            }
            TableLocation::Local(path) => {
                if !path.exists() {
                    return Err(AnalysisError::SourceError(format!(
                        "File not found: {}",
                        path.display()
                    )));
                }
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    AnalysisError::SourceError(format!("Reading {}: {}", path.display(), e))
                })
            }
        }
    }
}

#[async_trait]
impl TableSource for CsvTableSource {
    fn describe(&self) -> String {
        self.location.to_string()
    }

    async fn load(&self) -> Result<Table, AnalysisError> {
        tracing::info!(source = %self.location, "Loading statement table");
        let text = self.fetch_text().await?;
        let table = parse_csv(&text)?;
        tracing::info!(
            rows = table.len(),
            columns = table.headers().len(),
            "Loaded statement table"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "DATE,SALES_REV_TURN,GROSS_PROFIT\n\
                          12/31/2024, 133.1 ,53.24\n\
                          12/31/2025,146.41,\n";

    #[test]
    fn test_sheet_export_url() {
        assert_eq!(
            sheet_export_url("abc123"),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[test]
    fn test_location_parse() {
        assert_eq!(
            TableLocation::parse("https://example.com/data.csv"),
            TableLocation::Remote("https://example.com/data.csv".to_string())
        );
        assert_eq!(
            TableLocation::parse("data/ait.csv"),
            TableLocation::Local(PathBuf::from("data/ait.csv"))
        );
        assert!(matches!(TableLocation::sheet(DEFAULT_SHEET_ID), TableLocation::Remote(url) if url.ends_with("format=csv")));
    }

    #[test]
    fn test_parse_csv_trims_and_pads() {
        let table = parse_csv(SAMPLE).unwrap();
        assert_eq!(table.headers(), &["DATE", "SALES_REV_TURN", "GROSS_PROFIT"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.extract_column("SALES_REV_TURN").unwrap(), vec![133.1, 146.41]);
        assert!(table.extract_column("GROSS_PROFIT").unwrap()[1].is_nan());
    }

    #[test]
    fn test_parse_csv_skips_blank_rows() {
        let table = parse_csv("DATE,X\n,\n12/31/2025,1\n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_csv_empty_fails() {
        assert!(matches!(parse_csv(""), Err(AnalysisError::SourceError(_))));
        assert!(matches!(parse_csv("DATE,X\n"), Err(AnalysisError::SourceError(_))));
    }

    #[test]
    fn test_missing_file_fails_before_parsing() {
        let source = CsvTableSource::new(TableLocation::parse("/nonexistent/statements.csv"));
        let result = tokio_test::block_on(source.load());
        assert!(matches!(result, Err(AnalysisError::SourceError(msg)) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let path = std::env::temp_dir().join(format!("dcf-loader-{}.csv", std::process::id()));
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let source = CsvTableSource::new(TableLocation::Local(path.clone()));
        let table = source.load().await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(source.describe(), path.display().to_string());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
