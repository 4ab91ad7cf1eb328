use analysis_core::{
    AnalysisError, Decision, SeriesContext, Stage, TradeSignal, ValuationResult,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use series_math::{add, discount_factors, divide, last, subtract};

use crate::history::HistoricalStatements;
use crate::projection::Projection;

/// Free cash flow for the current year and each forecast year.
pub fn free_cash_flow(
    projection: &Projection,
    historical_years: usize,
) -> Result<Vec<f64>, AnalysisError> {
    let full = add(&projection.nopat, &projection.depreciation)
        .and_then(|v| add(&v, &projection.amortization))
        .and_then(|v| subtract(&v, &projection.capex))
        .and_then(|v| subtract(&v, &projection.delta_working_capital))
        .at(Stage::FreeCashFlow, "free cash flow")?;

    let from = historical_years.saturating_sub(1);
    if from >= full.len() {
        return Err(AnalysisError::InsufficientData(format!(
            "Free cash flow has {} periods, cannot start at period {}",
            full.len(),
            from
        )));
    }
    Ok(full[from..].to_vec())
}

/// Discounted free cash flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentValues {
    pub discount_factors: Vec<f64>,
    pub pv_fcf: Vec<f64>,
    pub sum: f64,
}

/// Divide `fcf` by `(1+wacc)^t` for t = 0..=horizon.
pub fn discount(fcf: &[f64], wacc: f64, horizon: usize) -> Result<PresentValues, AnalysisError> {
    let factors = discount_factors(wacc, horizon).at(Stage::Discount, "discount factors")?;
    let pv_fcf = divide(fcf, &factors).at(Stage::Discount, "present value of free cash flow")?;
    let sum: f64 = pv_fcf.iter().sum();
    tracing::info!(?factors, ?pv_fcf, sum, "Discounted free cash flow");
    Ok(PresentValues {
        discount_factors: factors,
        pv_fcf,
        sum,
    })
}

/// Gordon growth value of the cash flows after `last_fcf`.
pub fn terminal_value(last_fcf: f64, wacc: f64, growth: f64) -> f64 {
    last_fcf * (1.0 + growth) / (wacc - growth)
}

/// Claims on enterprise value at the latest balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalClaims {
    pub total_debt: f64,
    pub preferred_equity: f64,
    pub minority_interest: f64,
    pub cash: f64,
    pub shares_outstanding: f64,
}

impl CapitalClaims {
    pub fn latest(h: &HistoricalStatements) -> Result<Self, AnalysisError> {
        let at = |series: &[f64], name: &str| last(series).at(Stage::Valuation, name);
        Ok(Self {
            total_debt: at(&h.total_debt, "total debt")?,
            preferred_equity: at(&h.preferred_equity, "preferred equity")?,
            minority_interest: at(&h.minority_interest, "minority interest")?,
            cash: at(&h.cash, "cash")?,
            shares_outstanding: at(&h.shares_outstanding, "shares outstanding")?,
        })
    }
}

/// Enterprise value to per-share value.
pub fn value_equity(
    pv_fcf_sum: f64,
    last_fcf: f64,
    claims: &CapitalClaims,
    wacc: f64,
    growth: f64,
    horizon: usize,
) -> Result<ValuationResult, AnalysisError> {
    let terminal = terminal_value(last_fcf, wacc, growth);
    let pv_terminal = terminal / (1.0 + wacc).powi(horizon as i32);
    let enterprise_value = pv_fcf_sum + pv_terminal;

    if !enterprise_value.is_finite() {
        return Err(AnalysisError::CalculationError(format!(
            "enterprise value is not finite (pv_fcf_sum={}, pv_terminal_value={})",
            pv_fcf_sum, pv_terminal
        )));
    }
    if claims.shares_outstanding == 0.0 {
        return Err(AnalysisError::CalculationError(
            "shares outstanding is zero".to_string(),
        ));
    }

    let equity_value = enterprise_value - claims.total_debt - claims.preferred_equity
        - claims.minority_interest
        + claims.cash;
    let per_share_value = equity_value / claims.shares_outstanding;

    if !per_share_value.is_finite() {
        return Err(AnalysisError::CalculationError(format!(
            "per-share value is not finite (equity_value={}, shares_outstanding={})",
            equity_value, claims.shares_outstanding
        )));
    }

    let result = ValuationResult {
        pv_fcf_sum,
        terminal_value: terminal,
        pv_terminal_value: pv_terminal,
        enterprise_value,
        equity_value,
        per_share_value,
    };
    tracing::info!(
        terminal_value = result.terminal_value,
        enterprise_value = result.enterprise_value,
        equity_value = result.equity_value,
        per_share_value = result.per_share_value,
        "Valuation complete"
    );
    Ok(result)
}

/// Compare a per-share value with the market price.
pub fn signal(
    symbol: &str,
    per_share_value: f64,
    price: f64,
    threshold: f64,
) -> Result<TradeSignal, AnalysisError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AnalysisError::QuoteError(format!(
            "Price for {} must be positive, got {}",
            symbol, price
        )));
    }
    Ok(TradeSignal {
        symbol: symbol.to_string(),
        decision: Decision::decide(per_share_value, price, threshold),
        price,
        per_share_value,
        threshold,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn claims() -> CapitalClaims {
        CapitalClaims {
            total_debt: 50.0,
            preferred_equity: 5.0,
            minority_interest: 5.0,
            cash: 20.0,
            shares_outstanding: 10.0,
        }
    }

    #[test]
    fn test_discount_includes_current_year_at_face_value() {
        let pv = discount(&[10.0, 11.0, 12.1], 0.10, 2).unwrap();
        assert_eq!(pv.discount_factors.len(), 3);
        assert_eq!(pv.pv_fcf[0], 10.0);
        assert_relative_eq!(pv.pv_fcf[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(pv.pv_fcf[2], 10.0, epsilon = 1e-9);
        assert_relative_eq!(pv.sum, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_discount_shape_mismatch_is_attributed() {
        let err = discount(&[10.0, 11.0], 0.10, 2).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Discount));
    }

    #[test]
    fn test_terminal_value() {
        assert_relative_eq!(terminal_value(7.0, 0.10, 0.03), 103.0, epsilon = 1e-9);
    }

    #[test]
    fn test_value_equity_bridge() {
        let result = value_equity(30.0, 7.0, &claims(), 0.10, 0.03, 1).unwrap();
        assert_relative_eq!(result.pv_terminal_value, 103.0 / 1.1, epsilon = 1e-9);
        assert_relative_eq!(result.enterprise_value, 30.0 + 103.0 / 1.1, epsilon = 1e-9);
        assert_relative_eq!(
            result.equity_value,
            result.enterprise_value - 50.0 - 5.0 - 5.0 + 20.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(result.per_share_value, result.equity_value / 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_value_poisons_enterprise_value() {
        let err = value_equity(f64::NAN, 7.0, &claims(), 0.10, 0.03, 1).unwrap_err();
        assert!(matches!(err, AnalysisError::CalculationError(msg) if msg.contains("enterprise value")));
    }

    #[test]
    fn test_zero_shares_rejected() {
        let mut c = claims();
        c.shares_outstanding = 0.0;
        assert!(matches!(
            value_equity(30.0, 7.0, &c, 0.10, 0.03, 1),
            Err(AnalysisError::CalculationError(_))
        ));
    }

    #[test]
    fn test_signal_rejects_bad_price() {
        assert!(matches!(signal("AIT", 10.0, 0.0, 0.08), Err(AnalysisError::QuoteError(_))));
        assert!(matches!(signal("AIT", 10.0, f64::NAN, 0.08), Err(AnalysisError::QuoteError(_))));
    }

    #[test]
    fn test_signal_boundaries() {
        let (price, threshold) = (200.0, 0.08);
        let lower = (1.0 - threshold) * price;
        let upper = (1.0 + threshold) * price;
        assert_eq!(signal("AIT", lower, price, threshold).unwrap().decision, Decision::Buy);
        assert_eq!(signal("AIT", upper, price, threshold).unwrap().decision, Decision::Hold);
        assert_eq!(signal("AIT", lower - 0.01, price, threshold).unwrap().decision, Decision::Sell);
    }
}
