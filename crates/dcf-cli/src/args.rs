use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use data_loader::{TableLocation, DEFAULT_SHEET_ID};

pub const USAGE: &str = "\
Usage: dcf [OPTIONS]

Options:
  --csv <path|url>     Statement table from a CSV file or URL
  --sheet-id <id>      Statement table from a Google Sheets document
  --ticker <symbol>    Symbol to value and quote
  --price <price>      Use a fixed market price instead of fetching one
  --variables <file>   JSON file overriding statement column names
  --json               Print the full valuation report as JSON
  -h, --help           Show this message

Environment:
  DCF_CSV_PATH, DCF_SHEET_ID, DCF_TICKER, DCF_WACC, DCF_CURRENT_YEAR, ...";

/// Command-line options. Flags win over the matching environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub csv: Option<String>,
    pub sheet_id: Option<String>,
    pub ticker: Option<String>,
    pub price: Option<f64>,
    pub variables: Option<PathBuf>,
    pub json: bool,
    pub help: bool,
}

impl CliArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let value_of = |flag: &str| -> Result<Option<String>> {
            match args.iter().position(|a| a == flag) {
                Some(i) => args
                    .get(i + 1)
                    .filter(|v| !v.starts_with("--"))
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| anyhow!("{} requires a value", flag)),
                None => Ok(None),
            }
        };

        const KNOWN: &[&str] = &[
            "--csv", "--sheet-id", "--ticker", "--price", "--variables", "--json", "--help", "-h",
        ];
        if let Some(unknown) = args
            .iter()
            .find(|a| a.starts_with('-') && !KNOWN.contains(&a.as_str()))
        {
            bail!("Unknown option '{}'\n\n{}", unknown, USAGE);
        }

        let price = match value_of("--price")? {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .map_err(|e| anyhow!("Invalid --price '{}': {}", raw, e))?,
            ),
            None => None,
        };

        Ok(Self {
            csv: value_of("--csv")?,
            sheet_id: value_of("--sheet-id")?,
            ticker: value_of("--ticker")?,
            price,
            variables: value_of("--variables")?.map(PathBuf::from),
            json: args.iter().any(|a| a == "--json"),
            help: args.iter().any(|a| a == "--help" || a == "-h"),
        })
    }

    /// `--csv`, then `--sheet-id`, then `DCF_CSV_PATH`, then `DCF_SHEET_ID`, then the default sheet.
    pub fn table_location(&self) -> TableLocation {
        self.resolve_location(
            std::env::var("DCF_CSV_PATH").ok(),
            std::env::var("DCF_SHEET_ID").ok(),
        )
    }

    fn resolve_location(&self, env_csv: Option<String>, env_sheet: Option<String>) -> TableLocation {
        if let Some(csv) = &self.csv {
            return TableLocation::parse(csv);
        }
        if let Some(id) = &self.sheet_id {
            return TableLocation::sheet(id);
        }
        if let Some(csv) = env_csv.filter(|v| !v.trim().is_empty()) {
            return TableLocation::parse(&csv);
        }
        let id = env_sheet
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHEET_ID.to_string());
        TableLocation::sheet(&id)
    }
}
