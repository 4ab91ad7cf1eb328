use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade decision issued against the market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// SELL below `(1 - threshold) * price`, else BUY below `(1 + threshold) * price`,
    /// else HOLD. Both comparisons are strict and SELL is checked first.
    pub fn decide(per_share_value: f64, price: f64, threshold: f64) -> Self {
        if per_share_value < (1.0 - threshold) * price {
            Decision::Sell
        } else if per_share_value < (1.0 + threshold) * price {
            Decision::Buy
        } else {
            Decision::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar outputs of one valuation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub pv_fcf_sum: f64,
    pub terminal_value: f64,
    pub pv_terminal_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub per_share_value: f64,
}

/// Outcome of one reconciliation check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    /// Largest absolute gap between reported and recomputed values (NaN if any side is missing)
    pub max_abs_diff: f64,
}

/// Result of the data-quality gate run before projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub checks: Vec<CheckOutcome>,
    /// Recomputed tax expense / pretax income, the series carried into projection
    pub projected_tax_rate: Vec<f64>,
}

impl ReconciliationReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Decision bound to a symbol and the price it was made against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub decision: Decision,
    pub price: f64,
    pub per_share_value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}

impl TradeSignal {
    /// `"BUY AIT"` style line
    pub fn headline(&self) -> String {
        format!("{} {}", self.decision, self.symbol)
    }

    /// Per-share value relative to price, e.g. 0.12 = 12% above market
    pub fn upside(&self) -> f64 {
        if self.price > 0.0 {
            self.per_share_value / self.price - 1.0
        } else {
            f64::NAN
        }
    }
}
