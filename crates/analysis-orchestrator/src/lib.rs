use analysis_core::{AnalysisError, QuoteSource, TableSource, TradeSignal};
use fundamental_analysis::{signal, DcfEngine, DcfReport, ValuationConfig};
use serde::Serialize;

/// Everything one valuation run produced, ready to render or serialize.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationOutcome {
    pub source: String,
    pub config: ValuationConfig,
    pub report: DcfReport,
    pub signal: TradeSignal,
}

impl ValuationOutcome {
    pub fn headline(&self) -> String {
        self.signal.headline()
    }
}

/// Runs load, valuation, quote and decision in sequence. The first failure aborts the run.
pub struct ValuationOrchestrator {
    engine: DcfEngine,
}

impl ValuationOrchestrator {
    pub fn new(config: ValuationConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            engine: DcfEngine::new(config)?,
        })
    }

    pub fn config(&self) -> &ValuationConfig {
        self.engine.config()
    }

    pub async fn run(
        &self,
        tables: &dyn TableSource,
        quotes: &dyn QuoteSource,
    ) -> Result<ValuationOutcome, AnalysisError> {
        let config = self.engine.config();
        let source = tables.describe();
        tracing::info!(
            "Starting DCF valuation for {} ({}-{}, {} forecast years) from {}",
            config.ticker,
            config.history_start_year(),
            config.current_year,
            config.forecast_years,
            source
        );

        let table = tables.load().await?;
        if table.is_empty() {
            return Err(AnalysisError::SourceError(format!("{} returned no rows", source)));
        }

        let report = self.engine.evaluate_table(&table)?;
        tracing::info!(
            "Per-share value for {}: {:.2} (EV {:.2}, equity {:.2})",
            config.ticker,
            report.valuation.per_share_value,
            report.valuation.enterprise_value,
            report.valuation.equity_value
        );

        let price = quotes.last_price(&config.ticker).await?;
        let signal = signal(
            &config.ticker,
            report.valuation.per_share_value,
            price,
            config.decision_threshold,
        )?;
        tracing::info!(
            "[DECISION] {} (value {:.2} vs price {:.2}, upside {:+.1}%)",
            signal.headline(),
            signal.per_share_value,
            signal.price,
            signal.upside() * 100.0
        );

        Ok(ValuationOutcome {
            source,
            config: config.clone(),
            report,
            signal,
        })
    }
}

#[cfg(test)]
mod tests;
