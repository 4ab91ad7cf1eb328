use super::*;
use analysis_core::{Decision, Stage, Table};
use approx::assert_relative_eq;
use async_trait::async_trait;
use market_data::FixedQuote;

struct InMemoryTable(Table);

#[async_trait]
impl TableSource for InMemoryTable {
    fn describe(&self) -> String {
        "in-memory".to_string()
    }

    async fn load(&self) -> Result<Table, AnalysisError> {
        Ok(self.0.clone())
    }
}

struct UnreachableTable;

#[async_trait]
impl TableSource for UnreachableTable {
    fn describe(&self) -> String {
        "unreachable".to_string()
    }

    async fn load(&self) -> Result<Table, AnalysisError> {
        Err(AnalysisError::SourceError("connection refused".to_string()))
    }
}

struct DownQuote;

#[async_trait]
impl QuoteSource for DownQuote {
    async fn last_price(&self, symbol: &str) -> Result<f64, AnalysisError> {
        Err(AnalysisError::QuoteError(format!("{} unavailable", symbol)))
    }
}

/// Statement CSV in the default column layout, reconciling exactly.
fn statement_csv(sales: &[f64]) -> String {
    let header = "DATE,SALES_REV_TURN,IS_COG_AND_SERVICES_SOLD,GROSS_PROFIT,IS_OTHER_OPER_INC,\
                  IS_OPERATING_EXPN,IS_SGA_EXPENSE,IS_OPERATING_EXPENSES_RD,IS_OTHER_OPERATING_EXPENSES,\
                  IS_OPER_INC,PRETAX_INC,IS_INC_TAX_EXP,EFF_TAX_RATE,CAPITAL_EXPEND,CAP_EXPEND_TO_SALES,\
                  EBITDA,EBITA,IS_DEPR_EXP,BS_CUR_ASSET_REPORT,BS_CUR_LIAB,BS_ST_BORROW,\
                  BS_CURR_PORTION_LT_DEBT,BS_LT_BORROW,PFD_EQTY_HYBRID_CAPITAL,\
                  MINORITY_NONCONTROLLING_INTEREST,CASH_CASH_EQTY_STI_DETAILED,BS_SH_OUT";

    let mut csv = String::from(header);
    csv.push('\n');
    for (i, &s) in sales.iter().enumerate() {
        let cogs = 0.55 * s;
        let gross_profit = s - cogs;
        let sga = 0.18 * s;
        let rd = 0.04 * s;
        let oper_exp = (sga + rd) + 0.0;
        let oper_inc = gross_profit + (0.0 - oper_exp);
        let tax = 0.21 * oper_inc;
        let capex = 0.03 * s;
        let depreciation = 0.025 * s;
        let amortization = 0.005 * s;
        let ebita = oper_inc + amortization;
        let ebitda = ebita + depreciation;
        let row: Vec<String> = vec![
            format!("12/31/{}", 2021 + i),
            s.to_string(),
            cogs.to_string(),
            gross_profit.to_string(),
            "0".to_string(),
            oper_exp.to_string(),
            sga.to_string(),
            rd.to_string(),
            "0".to_string(),
            oper_inc.to_string(),
            oper_inc.to_string(),
            tax.to_string(),
            "21".to_string(),
            capex.to_string(),
            "3".to_string(),
            ebitda.to_string(),
            ebita.to_string(),
            depreciation.to_string(),
            (0.35 * s).to_string(),
            (0.15 * s).to_string(),
            "20".to_string(),
            "10".to_string(),
            "150".to_string(),
            "0".to_string(),
            "2".to_string(),
            "40".to_string(),
            "38".to_string(),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

fn statements() -> InMemoryTable {
    let csv = statement_csv(&[4_400.0, 4_600.0, 4_800.0, 5_000.0, 5_200.0]);
    InMemoryTable(data_loader::parse_csv(&csv).unwrap())
}

#[tokio::test]
async fn test_run_produces_decision() {
    let orchestrator = ValuationOrchestrator::new(ValuationConfig::default()).unwrap();
    let outcome = orchestrator
        .run(&statements(), &FixedQuote::new(1.0))
        .await
        .unwrap();

    assert_eq!(outcome.source, "in-memory");
    assert!(outcome.report.reconciliation.all_passed());
    assert_eq!(outcome.report.free_cash_flow.len(), 6);
    assert_eq!(outcome.signal.symbol, "AIT");
    assert_eq!(outcome.signal.price, 1.0);
    assert_relative_eq!(
        outcome.signal.per_share_value,
        outcome.report.valuation.per_share_value
    );
}

#[tokio::test]
async fn test_decision_follows_price() {
    let orchestrator = ValuationOrchestrator::new(ValuationConfig::default()).unwrap();
    let table = statements();
    let value = orchestrator
        .run(&table, &FixedQuote::new(1.0))
        .await
        .unwrap()
        .report
        .valuation
        .per_share_value;
    assert!(value > 0.0);

    let expensive = orchestrator.run(&table, &FixedQuote::new(value * 2.0)).await.unwrap();
    assert_eq!(expensive.signal.decision, Decision::Sell);
    assert_eq!(expensive.headline(), "SELL AIT");

    let fair = orchestrator.run(&table, &FixedQuote::new(value)).await.unwrap();
    assert_eq!(fair.signal.decision, Decision::Buy);

    let cheap = orchestrator.run(&table, &FixedQuote::new(value / 2.0)).await.unwrap();
    assert_eq!(cheap.signal.decision, Decision::Hold);
}

#[tokio::test]
async fn test_source_failure_aborts_run() {
    let orchestrator = ValuationOrchestrator::new(ValuationConfig::default()).unwrap();
    let err = orchestrator
        .run(&UnreachableTable, &FixedQuote::new(100.0))
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Load));
}

#[tokio::test]
async fn test_quote_failure_aborts_run() {
    let orchestrator = ValuationOrchestrator::new(ValuationConfig::default()).unwrap();
    let err = orchestrator.run(&statements(), &DownQuote).await.unwrap_err();
    assert!(matches!(err, AnalysisError::QuoteError(_)));
}

#[tokio::test]
async fn test_outcome_serializes() {
    let orchestrator = ValuationOrchestrator::new(ValuationConfig::default()).unwrap();
    let outcome = orchestrator
        .run(&statements(), &FixedQuote::new(50.0))
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["config"]["ticker"], "AIT");
    assert_eq!(json["report"]["projection"]["sales"].as_array().unwrap().len(), 10);
    assert!(json["signal"]["decision"].is_string());
}
