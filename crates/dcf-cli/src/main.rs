//! dcf: value one company by discounted cash flow and compare with its market price.
//!
//! Usage:
//!   dcf                                   # default sheet, live quote
//!   dcf --csv data/ait.csv --price 250    # offline
//!   dcf --sheet-id <id> --ticker MSFT --json

use analysis_core::QuoteSource;
use analysis_orchestrator::ValuationOrchestrator;
use anyhow::{Context, Result};
use data_loader::CsvTableSource;
use fundamental_analysis::{ValuationConfig, VariableNames};
use market_data::{FixedQuote, YahooFinanceClient};

mod args;

use args::{CliArgs, USAGE};

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                "dcf=info,analysis_orchestrator=info,fundamental_analysis=info,data_loader=info,market_data=info,series_math=warn",
            )
        })
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

fn load_config(cli: &CliArgs) -> Result<ValuationConfig> {
    let mut config = ValuationConfig::from_env().context("Invalid DCF_* configuration")?;
    if let Some(ticker) = &cli.ticker {
        config = config.with_ticker(ticker.as_str());
    }
    if let Some(path) = &cli.variables {
        let names = VariableNames::from_json_file(path)
            .with_context(|| format!("Loading variable names from {}", path.display()))?;
        config = config.with_variables(names);
    }
    config.validate().context("Invalid valuation configuration")?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = CliArgs::parse(&argv)?;
    if cli.help {
        println!("{}", USAGE);
        return Ok(());
    }

    init_tracing();

    let config = load_config(&cli)?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Ticker: {}", config.ticker);
    tracing::info!(
        "  Window: {}-{} + {} forecast years",
        config.history_start_year(),
        config.current_year,
        config.forecast_years
    );
    tracing::info!(
        "  WACC: {:.2}%, terminal growth: {:.2}%, threshold: {:.0}%",
        config.wacc * 100.0,
        config.terminal_growth_rate * 100.0,
        config.decision_threshold * 100.0
    );

    let tables = CsvTableSource::new(cli.table_location());
    let quotes: Box<dyn QuoteSource> = match cli.price {
        Some(price) => Box::new(FixedQuote::new(price)),
        None => Box::new(YahooFinanceClient::new()),
    };

    let orchestrator = ValuationOrchestrator::new(config)?;
    let outcome = match orchestrator.run(&tables, quotes.as_ref()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            match e.stage() {
                Some(stage) => tracing::error!("Valuation aborted at {} stage: {}", stage, e),
                None => tracing::error!("Valuation aborted: {}", e),
            }
            return Err(e).context("DCF valuation failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Serializing valuation report")?;
        println!("{}", json);
    } else {
        let v = &outcome.report.valuation;
        println!("Enterprise value:  {:>14.2}", v.enterprise_value);
        println!("Equity value:      {:>14.2}", v.equity_value);
        println!("Per-share value:   {:>14.2}", v.per_share_value);
        println!("Market price:      {:>14.2}", outcome.signal.price);
        println!("{}", outcome.headline());
    }

    Ok(())
}
