use analysis_core::{AnalysisError, SeriesContext, Stage, Table};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use series_math::{add, pct_change, subtract};

use crate::config::ValuationConfig;

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Historical statement lines for the valuation window, oldest year first.
///
/// Every series has one value per fiscal year in `years`. Missing cells are `NaN`.
/// Percent-quoted columns are already converted to fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalStatements {
    pub years: Vec<i32>,

    // Income statement
    pub sales: Vec<f64>,
    pub cogs: Vec<f64>,
    pub gross_profit: Vec<f64>,
    pub other_oper_inc: Vec<f64>,
    pub oper_exp: Vec<f64>,
    pub sga_exp: Vec<f64>,
    pub rd_exp: Vec<f64>,
    pub other_oper_exp: Vec<f64>,
    pub oper_inc: Vec<f64>,
    pub pretax_inc: Vec<f64>,
    pub tax_exp: Vec<f64>,
    pub effective_tax_rate: Vec<f64>,

    // Investment
    pub capex: Vec<f64>,
    pub capex_margin: Vec<f64>,
    pub ebitda: Vec<f64>,
    pub ebita: Vec<f64>,
    pub depreciation: Vec<f64>,

    // Balance sheet
    pub current_assets: Vec<f64>,
    pub current_liabilities: Vec<f64>,
    pub total_debt: Vec<f64>,
    pub preferred_equity: Vec<f64>,
    pub minority_interest: Vec<f64>,
    pub cash: Vec<f64>,
    pub shares_outstanding: Vec<f64>,

    // Derived
    pub amortization: Vec<f64>,
    pub working_capital: Vec<f64>,
    pub sales_growth: Vec<f64>,
}

impl HistoricalStatements {
    /// Select the configured window from `table` and extract every statement line.
    pub fn from_table(table: &Table, config: &ValuationConfig) -> Result<Self, AnalysisError> {
        let window = select_window(table, config)?;
        let (years, table) = (window.years, window.table);
        let names = &config.variables;

        let col = |name: &str| table.extract_column(name);
        let percent = |name: &str| -> Result<Vec<f64>, AnalysisError> {
            Ok(table
                .extract_column(name)?
                .into_iter()
                .map(|v| v / 100.0)
                .collect())
        };

        let sales = col(&names.sales)?;
        let oper_inc = col(&names.oper_inc)?;
        let ebita = col(&names.ebita)?;
        let current_assets = col(&names.current_assets)?;
        let current_liabilities = col(&names.current_liabilities)?;

        let short_term_debt = col(&names.short_term_debt)?;
        let current_portion = col(&names.current_portion_lt_debt)?;
        let long_term_debt = col(&names.long_term_debt)?;
        let total_debt = add(&short_term_debt, &current_portion)
            .and_then(|partial| add(&partial, &long_term_debt))
            .at(Stage::Extract, "total debt")?;

        let amortization = subtract(&ebita, &oper_inc).at(Stage::Extract, "amortization")?;
        let working_capital = subtract(&current_assets, &current_liabilities)
            .at(Stage::Extract, "working capital")?;
        let sales_growth = pct_change(&sales);

        let statements = Self {
            years,
            cogs: col(&names.cogs)?,
            gross_profit: col(&names.gross_profit)?,
            other_oper_inc: col(&names.other_oper_inc)?,
            oper_exp: col(&names.oper_exp)?,
            sga_exp: col(&names.sga_exp)?,
            rd_exp: col(&names.rd_exp)?,
            other_oper_exp: col(&names.other_oper_exp)?,
            pretax_inc: col(&names.pretax_inc)?,
            tax_exp: col(&names.tax_exp)?,
            effective_tax_rate: percent(&names.effective_tax_rate)?,
            capex: col(&names.capex)?,
            capex_margin: percent(&names.capex_to_sales)?,
            ebitda: col(&names.ebitda)?,
            depreciation: col(&names.depreciation)?,
            preferred_equity: col(&names.preferred_equity)?,
            minority_interest: col(&names.minority_interest)?,
            cash: col(&names.cash)?,
            shares_outstanding: col(&names.shares_outstanding)?,
            sales,
            oper_inc,
            ebita,
            current_assets,
            current_liabilities,
            total_debt,
            amortization,
            working_capital,
            sales_growth,
        };

        tracing::info!(
            years = ?statements.years,
            sales = ?statements.sales,
            "Loaded historical statements"
        );
        tracing::debug!(
            amortization = ?statements.amortization,
            working_capital = ?statements.working_capital,
            total_debt = ?statements.total_debt,
            sales_growth = ?statements.sales_growth,
            "Derived historical lines"
        );
        Ok(statements)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

struct Window {
    years: Vec<i32>,
    table: Table,
}

/// Keep rows whose fiscal year falls in the configured window, sorted by year.
fn select_window(table: &Table, config: &ValuationConfig) -> Result<Window, AnalysisError> {
    let date_column = &config.variables.date;
    let dates = table.text_column(date_column)?;

    let mut dated: Vec<(i32, usize)> = Vec::with_capacity(dates.len());
    for (row, raw) in dates.iter().enumerate() {
        match parse_date(raw) {
            Some(date) => dated.push((date.year(), row)),
            None => tracing::warn!(row, value = %raw, "Dropping row with unparseable date"),
        }
    }
    dated.sort_by_key(|(year, _)| *year);

    let start = config.history_start_year();
    let end = config.current_year;
    let (years, rows): (Vec<i32>, Vec<usize>) = dated
        .into_iter()
        .filter(|(year, _)| (start..=end).contains(year))
        .unzip();

    if years.len() != config.historical_years {
        return Err(AnalysisError::InsufficientData(format!(
            "Expected {} rows for fiscal years {}-{}, found {}",
            config.historical_years,
            start,
            end,
            years.len()
        )));
    }

    let mut seen = std::collections::BTreeSet::new();
    if let Some(dup) = years.iter().find(|year| !seen.insert(**year)) {
        return Err(AnalysisError::InvalidData(format!(
            "Fiscal year {} appears more than once in {}",
            dup, date_column
        )));
    }
    if let Some(missing) = (start..=end).find(|year| !seen.contains(year)) {
        return Err(AnalysisError::InsufficientData(format!(
            "No row for fiscal year {} in window {}-{}",
            missing, start, end
        )));
    }

    tracing::debug!(start, end, ?years, "Selected historical window");
    Ok(Window {
        years,
        table: table.select_rows(&rows),
    })
}
