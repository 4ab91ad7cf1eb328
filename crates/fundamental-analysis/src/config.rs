use std::env;
use std::path::Path;
use std::str::FromStr;

use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// Column names of the statement table, one per financial-statement line.
///
/// Defaults follow the terminal field mnemonics used by the source spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableNames {
    pub date: String,
    pub sales: String,
    pub cogs: String,
    pub gross_profit: String,
    pub other_oper_inc: String,
    pub oper_exp: String,
    pub sga_exp: String,
    pub rd_exp: String,
    pub other_oper_exp: String,
    pub oper_inc: String,
    pub pretax_inc: String,
    pub tax_exp: String,
    /// Quoted in percent
    pub effective_tax_rate: String,
    pub capex: String,
    /// Quoted in percent
    pub capex_to_sales: String,
    pub ebitda: String,
    pub ebita: String,
    pub depreciation: String,
    pub current_assets: String,
    pub current_liabilities: String,
    pub short_term_debt: String,
    pub current_portion_lt_debt: String,
    pub long_term_debt: String,
    pub preferred_equity: String,
    pub minority_interest: String,
    pub cash: String,
    pub shares_outstanding: String,
}

impl Default for VariableNames {
    fn default() -> Self {
        Self {
            date: "DATE".to_string(),
            sales: "SALES_REV_TURN".to_string(),
            cogs: "IS_COG_AND_SERVICES_SOLD".to_string(),
            gross_profit: "GROSS_PROFIT".to_string(),
            other_oper_inc: "IS_OTHER_OPER_INC".to_string(),
            oper_exp: "IS_OPERATING_EXPN".to_string(),
            sga_exp: "IS_SGA_EXPENSE".to_string(),
            rd_exp: "IS_OPERATING_EXPENSES_RD".to_string(),
            other_oper_exp: "IS_OTHER_OPERATING_EXPENSES".to_string(),
            oper_inc: "IS_OPER_INC".to_string(),
            pretax_inc: "PRETAX_INC".to_string(),
            tax_exp: "IS_INC_TAX_EXP".to_string(),
            effective_tax_rate: "EFF_TAX_RATE".to_string(),
            capex: "CAPITAL_EXPEND".to_string(),
            capex_to_sales: "CAP_EXPEND_TO_SALES".to_string(),
            ebitda: "EBITDA".to_string(),
            ebita: "EBITA".to_string(),
            depreciation: "IS_DEPR_EXP".to_string(),
            current_assets: "BS_CUR_ASSET_REPORT".to_string(),
            current_liabilities: "BS_CUR_LIAB".to_string(),
            short_term_debt: "BS_ST_BORROW".to_string(),
            current_portion_lt_debt: "BS_CURR_PORTION_LT_DEBT".to_string(),
            long_term_debt: "BS_LT_BORROW".to_string(),
            preferred_equity: "PFD_EQTY_HYBRID_CAPITAL".to_string(),
            minority_interest: "MINORITY_NONCONTROLLING_INTEREST".to_string(),
            cash: "CASH_CASH_EQTY_STI_DETAILED".to_string(),
            shares_outstanding: "BS_SH_OUT".to_string(),
        }
    }
}

impl VariableNames {
    /// Load overrides from a JSON object; unnamed fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::ConfigError(format!("Invalid variable names in {}: {}", path.display(), e))
        })
    }
}

/// Assumptions for one valuation run. Built once and passed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    // Window
    pub current_year: i32,       // last historical fiscal year
    pub historical_years: usize, // 5
    pub forecast_years: usize,   // 5

    // Terminal assumptions
    pub terminal_growth_rate: f64,   // 3%
    pub terminal_cogs_margin: f64,   // 60%
    pub terminal_sga_margin: f64,    // 30%
    pub terminal_rd_margin: f64,     // 10%
    pub terminal_depr_to_capex: f64, // 1.0, maintenance capex

    // Discounting and decision
    pub wacc: f64,
    pub ticker: String,
    pub decision_threshold: f64, // +/- 8%

    pub variables: VariableNames,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            current_year: 2025,
            historical_years: 5,
            forecast_years: 5,
            terminal_growth_rate: 0.03,
            terminal_cogs_margin: 0.60,
            terminal_sga_margin: 0.30,
            terminal_rd_margin: 0.10,
            terminal_depr_to_capex: 1.0,
            wacc: 0.1016,
            ticker: "AIT".to_string(),
            decision_threshold: 0.08,
            variables: VariableNames::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AnalysisError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AnalysisError::ConfigError(format!("{}='{}': {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

impl ValuationConfig {
    /// Read `DCF_*` environment variables on top of the defaults, then validate.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let d = Self::default();
        let config = Self {
            current_year: env_or("DCF_CURRENT_YEAR", d.current_year)?,
            historical_years: env_or("DCF_HISTORICAL_YEARS", d.historical_years)?,
            forecast_years: env_or("DCF_FORECAST_YEARS", d.forecast_years)?,
            terminal_growth_rate: env_or("DCF_TERMINAL_GROWTH_RATE", d.terminal_growth_rate)?,
            terminal_cogs_margin: env_or("DCF_TERMINAL_COGS_MARGIN", d.terminal_cogs_margin)?,
            terminal_sga_margin: env_or("DCF_TERMINAL_SGA_MARGIN", d.terminal_sga_margin)?,
            terminal_rd_margin: env_or("DCF_TERMINAL_RD_MARGIN", d.terminal_rd_margin)?,
            terminal_depr_to_capex: env_or("DCF_TERMINAL_DEPR_TO_CAPEX", d.terminal_depr_to_capex)?,
            wacc: env_or("DCF_WACC", d.wacc)?,
            ticker: d.ticker,
            decision_threshold: env_or("DCF_DECISION_THRESHOLD", d.decision_threshold)?,
            variables: d.variables,
        };
        let config = match env::var("DCF_TICKER") {
            Ok(ticker) => config.with_ticker(ticker),
            Err(_) => config,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = ticker.into().trim().to_uppercase();
        self
    }

    pub fn with_variables(mut self, variables: VariableNames) -> Self {
        self.variables = variables;
        self
    }

    /// First fiscal year of the historical window.
    pub fn history_start_year(&self) -> i32 {
        self.current_year - self.historical_years as i32 + 1
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.historical_years < 2 {
            return Err(AnalysisError::ConfigError(format!(
                "historical_years must be at least 2, got {}",
                self.historical_years
            )));
        }
        if self.forecast_years < 1 {
            return Err(AnalysisError::ConfigError(
                "forecast_years must be at least 1".to_string(),
            ));
        }
        if !self.wacc.is_finite() || !self.terminal_growth_rate.is_finite() {
            return Err(AnalysisError::ConfigError(
                "wacc and terminal_growth_rate must be finite".to_string(),
            ));
        }
        if self.wacc <= self.terminal_growth_rate {
            return Err(AnalysisError::ConfigError(format!(
                "wacc ({}) must exceed terminal_growth_rate ({})",
                self.wacc, self.terminal_growth_rate
            )));
        }
        if !(0.0..1.0).contains(&self.decision_threshold) {
            return Err(AnalysisError::ConfigError(format!(
                "decision_threshold must be in [0, 1), got {}",
                self.decision_threshold
            )));
        }
        if self.ticker.trim().is_empty() {
            return Err(AnalysisError::ConfigError("ticker must not be empty".to_string()));
        }
        Ok(())
    }
}
