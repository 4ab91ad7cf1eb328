use analysis_core::{AnalysisError, QuoteSource};
use async_trait::async_trait;

/// Quote source that always returns the same price. Used for offline runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedQuote {
    price: f64,
}

impl FixedQuote {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl QuoteSource for FixedQuote {
    async fn last_price(&self, symbol: &str) -> Result<f64, AnalysisError> {
        tracing::info!(symbol, price = self.price, "Using fixed price");
        Ok(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_quote_ignores_symbol() {
        let quote = FixedQuote::new(212.5);
        assert_eq!(quote.last_price("AIT").await.unwrap(), 212.5);
        assert_eq!(quote.last_price("MSFT").await.unwrap(), 212.5);
    }
}
