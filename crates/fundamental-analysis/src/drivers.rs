use std::fmt;

use analysis_core::{AnalysisError, SeriesContext, Stage};
use serde::{Deserialize, Serialize};
use series_math::{divide, last, multiply, nan_mean, ExtrapolationPolicy};

use crate::config::ValuationConfig;
use crate::history::HistoricalStatements;

/// Forecast assumption carried past the historical window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    SalesGrowth,
    CogsMargin,
    OtherOperIncMargin,
    SgaMargin,
    RdMargin,
    OtherOperExpMargin,
    EffectiveTaxRate,
    CapexMargin,
    DeprToCapex,
    AmortizationMargin,
    WorkingCapitalMargin,
}

impl Driver {
    pub const ALL: [Driver; 11] = [
        Driver::SalesGrowth,
        Driver::CogsMargin,
        Driver::OtherOperIncMargin,
        Driver::SgaMargin,
        Driver::RdMargin,
        Driver::OtherOperExpMargin,
        Driver::EffectiveTaxRate,
        Driver::CapexMargin,
        Driver::DeprToCapex,
        Driver::AmortizationMargin,
        Driver::WorkingCapitalMargin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Driver::SalesGrowth => "sales growth",
            Driver::CogsMargin => "COGS margin",
            Driver::OtherOperIncMargin => "other operating income margin",
            Driver::SgaMargin => "SG&A margin",
            Driver::RdMargin => "R&D margin",
            Driver::OtherOperExpMargin => "other operating expense margin",
            Driver::EffectiveTaxRate => "effective tax rate",
            Driver::CapexMargin => "capex margin",
            Driver::DeprToCapex => "depreciation to capex",
            Driver::AmortizationMargin => "amortization margin",
            Driver::WorkingCapitalMargin => "working capital margin",
        }
    }

    /// Glide start and end, derived from the driver's own history.
    pub fn policy(
        &self,
        history: &[f64],
        config: &ValuationConfig,
    ) -> Result<ExtrapolationPolicy, AnalysisError> {
        let mean = nan_mean(history);
        let latest = last(history).at(Stage::Extrapolate, self.label())?;

        let (start, end) = match self {
            Driver::SalesGrowth => (mean, config.terminal_growth_rate),
            Driver::CogsMargin => (mean, mean.min(config.terminal_cogs_margin)),
            Driver::OtherOperIncMargin => (latest, 0.0),
            Driver::SgaMargin => (latest, mean.min(config.terminal_sga_margin)),
            Driver::RdMargin => (latest, mean.max(config.terminal_rd_margin)),
            Driver::OtherOperExpMargin => (latest, 0.0),
            Driver::EffectiveTaxRate => (latest, latest),
            Driver::CapexMargin => (mean, mean),
            Driver::DeprToCapex => (latest, config.terminal_depr_to_capex),
            Driver::AmortizationMargin => (mean, mean),
            Driver::WorkingCapitalMargin => (mean, mean),
        };
        Ok(ExtrapolationPolicy::Glide { start, end })
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Historical ratios of each line to sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginSet {
    pub cogs: Vec<f64>,
    pub other_oper_inc: Vec<f64>,
    pub sga: Vec<f64>,
    pub rd: Vec<f64>,
    pub other_oper_exp: Vec<f64>,
    pub capex: Vec<f64>,
    pub depr_to_capex: Vec<f64>,
    pub amortization: Vec<f64>,
    pub working_capital: Vec<f64>,
}

impl MarginSet {
    pub fn from_history(h: &HistoricalStatements) -> Result<Self, AnalysisError> {
        let of_sales = |line: &[f64], name: &str| divide(line, &h.sales).at(Stage::Margins, name);

        let capex_amount =
            multiply(&h.capex_margin, &h.sales).at(Stage::Margins, "depreciation to capex")?;
        let depr_to_capex =
            divide(&h.depreciation, &capex_amount).at(Stage::Margins, "depreciation to capex")?;

        let margins = Self {
            cogs: of_sales(&h.cogs, "COGS margin")?,
            other_oper_inc: of_sales(&h.other_oper_inc, "other operating income margin")?,
            sga: of_sales(&h.sga_exp, "SG&A margin")?,
            rd: of_sales(&h.rd_exp, "R&D margin")?,
            other_oper_exp: of_sales(&h.other_oper_exp, "other operating expense margin")?,
            capex: h.capex_margin.clone(),
            depr_to_capex,
            amortization: of_sales(&h.amortization, "amortization margin")?,
            working_capital: of_sales(&h.working_capital, "working capital margin")?,
        };
        tracing::debug!(?margins, "Historical margins");
        Ok(margins)
    }
}

/// Every driver extended over the full window, `historical_years + forecast_years` periods each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPaths {
    pub sales_growth: Vec<f64>,
    pub cogs_margin: Vec<f64>,
    pub other_oper_inc_margin: Vec<f64>,
    pub sga_margin: Vec<f64>,
    pub rd_margin: Vec<f64>,
    pub other_oper_exp_margin: Vec<f64>,
    pub effective_tax_rate: Vec<f64>,
    pub capex_margin: Vec<f64>,
    pub depr_to_capex: Vec<f64>,
    pub amortization_margin: Vec<f64>,
    pub working_capital_margin: Vec<f64>,
    pub policies: Vec<(Driver, ExtrapolationPolicy)>,
}

impl DriverPaths {
    /// Extend every driver. `tax_rate` is the recomputed effective tax rate.
    pub fn extend(
        h: &HistoricalStatements,
        margins: &MarginSet,
        tax_rate: &[f64],
        config: &ValuationConfig,
    ) -> Result<Self, AnalysisError> {
        let mut policies = Vec::with_capacity(Driver::ALL.len());
        let mut run = |driver: Driver, history: &[f64]| -> Result<Vec<f64>, AnalysisError> {
            let policy = driver.policy(history, config)?;
            let path = series_math::extend(history, config.forecast_years as i64, policy)
                .at(Stage::Extrapolate, driver.label())?;
            tracing::info!(driver = %driver, ?policy, ?path, "Extended driver");
            policies.push((driver, policy));
            Ok(path)
        };

        let sales_growth = run(Driver::SalesGrowth, &h.sales_growth)?;
        let cogs_margin = run(Driver::CogsMargin, &margins.cogs)?;
        let other_oper_inc_margin = run(Driver::OtherOperIncMargin, &margins.other_oper_inc)?;
        let sga_margin = run(Driver::SgaMargin, &margins.sga)?;
        let rd_margin = run(Driver::RdMargin, &margins.rd)?;
        let other_oper_exp_margin = run(Driver::OtherOperExpMargin, &margins.other_oper_exp)?;
        let effective_tax_rate = run(Driver::EffectiveTaxRate, tax_rate)?;
        let capex_margin = run(Driver::CapexMargin, &margins.capex)?;
        let depr_to_capex = run(Driver::DeprToCapex, &margins.depr_to_capex)?;
        let amortization_margin = run(Driver::AmortizationMargin, &margins.amortization)?;
        let working_capital_margin = run(Driver::WorkingCapitalMargin, &margins.working_capital)?;

        Ok(Self {
            sales_growth,
            cogs_margin,
            other_oper_inc_margin,
            sga_margin,
            rd_margin,
            other_oper_exp_margin,
            effective_tax_rate,
            capex_margin,
            depr_to_capex,
            amortization_margin,
            working_capital_margin,
            policies,
        })
    }
}
