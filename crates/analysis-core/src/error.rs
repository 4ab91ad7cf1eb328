use std::fmt;

use thiserror::Error;

/// Contract failures raised by the series primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Shape mismatch: left has {left} periods, right has {right}")]
    ShapeMismatch { left: usize, right: usize },

    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),

    #[error("Series is empty")]
    EmptySeries,

    #[error("Forecast horizon must be non-negative, got {0}")]
    NegativeHorizon(i64),

    #[error("Unsupported extrapolation method '{0}', use 'average' or 'last'")]
    UnsupportedMethod(String),
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Extract,
    Reconcile,
    Margins,
    Extrapolate,
    Project,
    FreeCashFlow,
    Discount,
    Valuation,
    Quote,
    Decision,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Extract => "extract",
            Stage::Reconcile => "reconcile",
            Stage::Margins => "margins",
            Stage::Extrapolate => "extrapolate",
            Stage::Project => "project",
            Stage::FreeCashFlow => "free cash flow",
            Stage::Discount => "discount",
            Stage::Valuation => "valuation",
            Stage::Quote => "quote",
            Stage::Decision => "decision",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{stage} stage failed for `{quantity}`: {source}")]
    Series {
        stage: Stage,
        quantity: String,
        #[source]
        source: SeriesError,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Quote error: {0}")]
    QuoteError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AnalysisError {
    /// Stage the error belongs to, when it carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AnalysisError::Series { stage, .. } => Some(*stage),
            AnalysisError::MissingColumn(_) | AnalysisError::InvalidData(_) => Some(Stage::Extract),
            AnalysisError::SourceError(_) | AnalysisError::InsufficientData(_) => Some(Stage::Load),
            AnalysisError::QuoteError(_) => Some(Stage::Quote),
            AnalysisError::CalculationError(_) => Some(Stage::Valuation),
            AnalysisError::ConfigError(_) => None,
        }
    }
}

/// Attach a stage and a quantity name to a [`SeriesError`].
pub trait SeriesContext<T> {
    fn at(self, stage: Stage, quantity: &str) -> Result<T, AnalysisError>;
}

impl<T> SeriesContext<T> for Result<T, SeriesError> {
    fn at(self, stage: Stage, quantity: &str) -> Result<T, AnalysisError> {
        self.map_err(|source| AnalysisError::Series {
            stage,
            quantity: quantity.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_context_names_stage_and_quantity() {
        let failed: Result<(), SeriesError> = Err(SeriesError::ShapeMismatch { left: 5, right: 4 });
        let err = failed.at(Stage::Margins, "COGS margin").unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Margins));
        assert_eq!(
            err.to_string(),
            "margins stage failed for `COGS margin`: Shape mismatch: left has 5 periods, right has 4"
        );
    }
}
