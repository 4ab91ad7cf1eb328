use analysis_core::{AnalysisError, ReconciliationReport, SeriesContext, Stage, Table, ValuationResult};
use serde::{Deserialize, Serialize};
use series_math::last;

use crate::config::ValuationConfig;
use crate::consistency::ConsistencyChecker;
use crate::drivers::{DriverPaths, MarginSet};
use crate::history::HistoricalStatements;
use crate::projection::Projection;
use crate::valuation::{discount, free_cash_flow, value_equity, CapitalClaims, PresentValues};

/// Every intermediate of one DCF run, in stage order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfReport {
    /// Historical years followed by forecast years
    pub years: Vec<i32>,
    pub reconciliation: ReconciliationReport,
    pub margins: MarginSet,
    pub drivers: DriverPaths,
    pub projection: Projection,
    /// Current year and each forecast year
    pub free_cash_flow: Vec<f64>,
    pub present_values: PresentValues,
    pub claims: CapitalClaims,
    pub valuation: ValuationResult,
}

/// Pure DCF pipeline over historical statements. No I/O.
pub struct DcfEngine {
    config: ValuationConfig,
    checker: ConsistencyChecker,
}

impl DcfEngine {
    pub fn new(config: ValuationConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            checker: ConsistencyChecker::default(),
        })
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub fn load_history(&self, table: &Table) -> Result<HistoricalStatements, AnalysisError> {
        HistoricalStatements::from_table(table, &self.config)
    }

    /// Load the window from `table` and value it.
    pub fn evaluate_table(&self, table: &Table) -> Result<DcfReport, AnalysisError> {
        let history = self.load_history(table)?;
        self.value(&history)
    }

    pub fn value(&self, h: &HistoricalStatements) -> Result<DcfReport, AnalysisError> {
        let config = &self.config;
        if h.len() != config.historical_years {
            return Err(AnalysisError::InsufficientData(format!(
                "Expected {} historical years, got {}",
                config.historical_years,
                h.len()
            )));
        }

        let reconciliation = self.checker.check(h)?;
        if !reconciliation.all_passed() {
            tracing::warn!(
                failed = reconciliation.failed().count(),
                "Statement reconciliation has mismatches"
            );
        }

        let margins = MarginSet::from_history(h)?;
        let drivers = DriverPaths::extend(h, &margins, &reconciliation.projected_tax_rate, config)?;
        let projection = Projection::build(h, &drivers)?;

        let fcf = free_cash_flow(&projection, config.historical_years)?;
        tracing::info!(free_cash_flow = ?fcf, "Free cash flow, current and forecast years");

        let present_values = discount(&fcf, config.wacc, config.forecast_years)?;
        let last_fcf = last(&fcf).at(Stage::Valuation, "free cash flow")?;

        let claims = CapitalClaims::latest(h)?;
        let valuation = value_equity(
            present_values.sum,
            last_fcf,
            &claims,
            config.wacc,
            config.terminal_growth_rate,
            config.forecast_years,
        )?;

        let mut years = h.years.clone();
        let current = h.years.last().copied().unwrap_or(config.current_year);
        years.extend((1..=config.forecast_years as i32).map(|k| current + k));

        Ok(DcfReport {
            years,
            reconciliation,
            margins,
            drivers,
            projection,
            free_cash_flow: fcf,
            present_values,
            claims,
            valuation,
        })
    }
}
