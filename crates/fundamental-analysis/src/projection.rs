use analysis_core::{AnalysisError, SeriesContext, Stage};
use serde::{Deserialize, Serialize};
use series_math::{add, compound, delta, last, multiply, offset, subtract, FirstValue};

use crate::drivers::DriverPaths;
use crate::history::HistoricalStatements;

/// Statement lines over the full window, period-aligned with [`DriverPaths`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub sales: Vec<f64>,
    pub cogs: Vec<f64>,
    pub gross_profit: Vec<f64>,
    pub other_oper_inc: Vec<f64>,
    pub sga: Vec<f64>,
    pub rd: Vec<f64>,
    pub other_oper_exp: Vec<f64>,
    pub oper_exp: Vec<f64>,
    pub ebit: Vec<f64>,
    pub nopat: Vec<f64>,
    pub capex: Vec<f64>,
    pub depreciation: Vec<f64>,
    pub amortization: Vec<f64>,
    pub working_capital: Vec<f64>,
    pub delta_working_capital: Vec<f64>,
}

/// Sales path: historical actuals up to the prior year, then the current year
/// compounded forward through the forecast growth rates.
pub fn sales_path(
    h: &HistoricalStatements,
    drivers: &DriverPaths,
) -> Result<Vec<f64>, AnalysisError> {
    let n = h.sales.len();
    let latest = last(&h.sales).at(Stage::Project, "sales")?;
    let forecast_growth = drivers.sales_growth.get(n..).unwrap_or_default();
    let forward = compound(latest, forecast_growth).at(Stage::Project, "sales")?;

    let mut path = Vec::with_capacity(n - 1 + forward.len());
    path.extend_from_slice(&h.sales[..n - 1]);
    path.extend(forward);
    Ok(path)
}

impl Projection {
    pub fn build(h: &HistoricalStatements, drivers: &DriverPaths) -> Result<Self, AnalysisError> {
        let sales = sales_path(h, drivers)?;
        let on_sales =
            |margin: &[f64], name: &str| multiply(&sales, margin).at(Stage::Project, name);

        let cogs = on_sales(&drivers.cogs_margin, "COGS")?;
        let gross_profit = subtract(&sales, &cogs).at(Stage::Project, "gross profit")?;
        let other_oper_inc = on_sales(&drivers.other_oper_inc_margin, "other operating income")?;
        let sga = on_sales(&drivers.sga_margin, "SG&A")?;
        let rd = on_sales(&drivers.rd_margin, "R&D")?;
        let other_oper_exp = on_sales(&drivers.other_oper_exp_margin, "other operating expense")?;

        let oper_exp = add(&sga, &rd)
            .and_then(|partial| add(&partial, &other_oper_exp))
            .at(Stage::Project, "operating expense")?;
        let ebit = subtract(&other_oper_inc, &oper_exp)
            .and_then(|net| add(&gross_profit, &net))
            .at(Stage::Project, "EBIT")?;
        let nopat = multiply(&ebit, &offset(1.0, &drivers.effective_tax_rate))
            .at(Stage::Project, "NOPAT")?;

        let capex = on_sales(&drivers.capex_margin, "capex")?;
        let depreciation = multiply(&capex, &drivers.depr_to_capex).at(Stage::Project, "depreciation")?;
        let amortization = on_sales(&drivers.amortization_margin, "amortization")?;
        let working_capital = on_sales(&drivers.working_capital_margin, "working capital")?;
        let delta_working_capital =
            delta(&working_capital, FirstValue::Zero).at(Stage::Project, "change in working capital")?;

        let projection = Self {
            sales,
            cogs,
            gross_profit,
            other_oper_inc,
            sga,
            rd,
            other_oper_exp,
            oper_exp,
            ebit,
            nopat,
            capex,
            depreciation,
            amortization,
            working_capital,
            delta_working_capital,
        };
        tracing::info!(
            sales = ?projection.sales,
            ebit = ?projection.ebit,
            nopat = ?projection.nopat,
            "Projected statements"
        );
        tracing::debug!(
            capex = ?projection.capex,
            depreciation = ?projection.depreciation,
            amortization = ?projection.amortization,
            delta_working_capital = ?projection.delta_working_capital,
            "Projected investment lines"
        );
        Ok(projection)
    }
}
