use std::time::Duration;

use analysis_core::{AnalysisError, QuoteSource};
use async_trait::async_trait;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_ATTEMPTS: u32 = 2;

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// GET the chart endpoint, retrying once on transport errors and 429/5xx responses.
    async fn fetch_chart(&self, symbol: &str) -> Result<serde_json::Value, AnalysisError> {
        let url = format!("{}/{}?range=1d&interval=1d", self.base_url, symbol);
        let mut attempt = 1;

        loop {
            let error = match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json()
                            .await
                            .map_err(|e| AnalysisError::QuoteError(format!("Invalid response for {}: {}", symbol, e)));
                    }
                    if !(status.is_server_error() || status.as_u16() == 429) {
                        return Err(AnalysisError::QuoteError(format!(
                            "Quote request for {} returned {}",
                            symbol, status
                        )));
                    }
                    format!("status {}", status)
                }
                Err(e) => e.to_string(),
            };

            if attempt >= MAX_ATTEMPTS {
                return Err(AnalysisError::QuoteError(format!(
                    "Quote request for {} failed after {} attempts: {}",
                    symbol, MAX_ATTEMPTS, error
                )));
            }
            tracing::warn!(
                symbol,
                error = %error,
                "Quote request failed, retry {}/{}",
                attempt,
                MAX_ATTEMPTS - 1
            );
            tokio::time::sleep(RETRY_DELAY).await;
            attempt += 1;
        }
    }
}

/// Extract `chart.result[0].meta.regularMarketPrice` from a chart response.
pub fn parse_last_price(json: &serde_json::Value, symbol: &str) -> Result<f64, AnalysisError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AnalysisError::QuoteError(format!("No chart data found for {}", symbol)))?;

    if let Some(description) = chart
        .get("error")
        .and_then(|e| e.get("description"))
        .and_then(|d| d.as_str())
    {
        return Err(AnalysisError::QuoteError(format!("{}: {}", symbol, description)));
    }

    let price = chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|result| result.get("meta"))
        .and_then(|meta| meta.get("regularMarketPrice"))
        .and_then(|v| v.as_f64())
        .ok_or_else(|| AnalysisError::QuoteError(format!("No market price found for {}", symbol)))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(AnalysisError::QuoteError(format!(
            "Market price for {} must be positive, got {}",
            symbol, price
        )));
    }
    Ok(price)
}

#[async_trait]
impl QuoteSource for YahooFinanceClient {
    async fn last_price(&self, symbol: &str) -> Result<f64, AnalysisError> {
        let json = self.fetch_chart(symbol).await?;
        let price = parse_last_price(&json, symbol)?;
        tracing::info!(symbol, price, "Fetched last price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_last_price() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AIT", "currency": "USD", "regularMarketPrice": 254.37 },
                    "timestamp": [1760448600]
                }],
                "error": null
            }
        });
        assert_eq!(parse_last_price(&body, "AIT").unwrap(), 254.37);
    }

    #[test]
    fn test_parse_chart_error() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        let err = parse_last_price(&body, "ZZZZ").unwrap_err();
        assert!(matches!(err, AnalysisError::QuoteError(msg) if msg.contains("delisted")));
    }

    #[test]
    fn test_parse_missing_or_bad_price() {
        let no_meta = json!({ "chart": { "result": [{}], "error": null } });
        assert!(parse_last_price(&no_meta, "AIT").is_err());

        let zero = json!({ "chart": { "result": [{ "meta": { "regularMarketPrice": 0.0 } }] } });
        assert!(matches!(parse_last_price(&zero, "AIT"), Err(AnalysisError::QuoteError(_))));

        assert!(parse_last_price(&json!({}), "AIT").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_retry() {
        let client = YahooFinanceClient::with_base_url("http://127.0.0.1:9/chart");
        let err = client.last_price("AIT").await.unwrap_err();
        assert!(matches!(err, AnalysisError::QuoteError(msg) if msg.contains("2 attempts")));
    }
}
