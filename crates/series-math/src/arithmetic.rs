use std::str::FromStr;

use analysis_core::SeriesError;
use serde::{Deserialize, Serialize};

const ADD_NAMES: &[&str] = &["add", "addition", "sum", "plus", "+"];
const SUB_NAMES: &[&str] = &["subtract", "sub", "minus", "-"];
const MUL_NAMES: &[&str] = &["multiply", "times", "*"];
const DIV_NAMES: &[&str] = &["divide", "div", "/"];

/// Elementwise operation between two period-aligned series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArrayOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArrayOp::Add => a + b,
            ArrayOp::Subtract => a - b,
            ArrayOp::Multiply => a * b,
            // A zero denominator maps to the missing-value sentinel, never to ±inf.
            ArrayOp::Divide => {
                if b == 0.0 {
                    f64::NAN
                } else {
                    a / b
                }
            }
        }
    }
}

impl FromStr for ArrayOp {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = s.trim().to_lowercase();
        if ADD_NAMES.contains(&op.as_str()) {
            Ok(ArrayOp::Add)
        } else if SUB_NAMES.contains(&op.as_str()) {
            Ok(ArrayOp::Subtract)
        } else if MUL_NAMES.contains(&op.as_str()) {
            Ok(ArrayOp::Multiply)
        } else if DIV_NAMES.contains(&op.as_str()) {
            Ok(ArrayOp::Divide)
        } else {
            Err(SeriesError::UnknownOperation(s.to_string()))
        }
    }
}

/// Combine two series elementwise.
///
/// Lengths must match exactly; there is no broadcasting. For [`ArrayOp::Divide`],
/// every position whose denominator is exactly zero yields `NaN`.
pub fn combine(a: &[f64], b: &[f64], op: ArrayOp) -> Result<Vec<f64>, SeriesError> {
    if a.len() != b.len() {
        return Err(SeriesError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    tracing::debug!("{:?} over {} periods", op, a.len());
    Ok(a.iter().zip(b).map(|(&x, &y)| op.apply(x, y)).collect())
}

/// [`combine`] with the operation given by name, e.g. `"plus"` or `"/"`.
pub fn combine_named(a: &[f64], b: &[f64], op: &str) -> Result<Vec<f64>, SeriesError> {
    combine(a, b, op.parse()?)
}

pub fn add(a: &[f64], b: &[f64]) -> Result<Vec<f64>, SeriesError> {
    combine(a, b, ArrayOp::Add)
}

pub fn subtract(a: &[f64], b: &[f64]) -> Result<Vec<f64>, SeriesError> {
    combine(a, b, ArrayOp::Subtract)
}

pub fn multiply(a: &[f64], b: &[f64]) -> Result<Vec<f64>, SeriesError> {
    combine(a, b, ArrayOp::Multiply)
}

pub fn divide(a: &[f64], b: &[f64]) -> Result<Vec<f64>, SeriesError> {
    combine(a, b, ArrayOp::Divide)
}

/// Multiply every period by a scalar.
pub fn scale(a: &[f64], k: f64) -> Vec<f64> {
    a.iter().map(|x| x * k).collect()
}

/// `k - a[i]` for every period, e.g. `offset(1.0, tax_rate)` for the after-tax share.
pub fn offset(k: f64, a: &[f64]) -> Vec<f64> {
    a.iter().map(|x| k - x).collect()
}
