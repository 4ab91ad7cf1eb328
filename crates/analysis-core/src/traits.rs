use async_trait::async_trait;
use crate::{AnalysisError, Table};

/// Source of historical financial-statement rows
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Short human-readable location, used in logs
    fn describe(&self) -> String;

    async fn load(&self) -> Result<Table, AnalysisError>;
}

/// Source of the current market price for a ticker
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn last_price(&self, symbol: &str) -> Result<f64, AnalysisError>;
}
