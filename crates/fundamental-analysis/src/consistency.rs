use analysis_core::{AnalysisError, CheckOutcome, ReconciliationReport, SeriesContext, Stage};
use series_math::{add, allclose, divide, subtract};

use crate::history::HistoricalStatements;

pub const DEFAULT_RTOL: f64 = 1e-5;
pub const DEFAULT_ATOL: f64 = 1e-5;

/// Recomputes derived statement lines from their components and compares them
/// with the reported values.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyChecker {
    rtol: f64,
    atol: f64,
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new(DEFAULT_RTOL, DEFAULT_ATOL)
    }
}

impl ConsistencyChecker {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Run all five checks. Mismatches are reported, not raised.
    pub fn check(&self, h: &HistoricalStatements) -> Result<ReconciliationReport, AnalysisError> {
        let gross_profit = subtract(&h.sales, &h.cogs).at(Stage::Reconcile, "gross profit")?;

        let oper_exp = add(&h.sga_exp, &h.rd_exp)
            .and_then(|partial| add(&partial, &h.other_oper_exp))
            .at(Stage::Reconcile, "operating expense")?;

        let oper_inc = subtract(&h.other_oper_inc, &h.oper_exp)
            .and_then(|net| add(&h.gross_profit, &net))
            .at(Stage::Reconcile, "operating income")?;

        let tax_rate = divide(&h.tax_exp, &h.pretax_inc).at(Stage::Reconcile, "effective tax rate")?;

        let depreciation = subtract(&h.ebitda, &h.ebita).at(Stage::Reconcile, "depreciation")?;

        let checks = vec![
            self.compare("gross profit", &h.gross_profit, &gross_profit)?,
            self.compare("operating expense", &h.oper_exp, &oper_exp)?,
            self.compare("operating income", &h.oper_inc, &oper_inc)?,
            self.compare("effective tax rate", &h.effective_tax_rate, &tax_rate)?,
            self.compare("depreciation", &h.depreciation, &depreciation)?,
        ];

        for outcome in &checks {
            if outcome.passed {
                tracing::info!(check = %outcome.name, "Reconciliation passed");
            } else {
                tracing::warn!(
                    check = %outcome.name,
                    max_abs_diff = outcome.max_abs_diff,
                    "Reconciliation failed, continuing with reported values"
                );
            }
        }

        Ok(ReconciliationReport {
            checks,
            projected_tax_rate: tax_rate,
        })
    }

    fn compare(
        &self,
        name: &str,
        reported: &[f64],
        recomputed: &[f64],
    ) -> Result<CheckOutcome, AnalysisError> {
        let passed = allclose(reported, recomputed, self.rtol, self.atol).at(Stage::Reconcile, name)?;
        Ok(CheckOutcome {
            name: name.to_string(),
            passed,
            max_abs_diff: max_abs_diff(reported, recomputed),
        })
    }
}

/// `NaN` when either side has a missing value.
fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).fold(0.0, |acc: f64, (x, y)| {
        let diff = (x - y).abs();
        if diff.is_nan() || acc.is_nan() {
            f64::NAN
        } else {
            acc.max(diff)
        }
    })
}
