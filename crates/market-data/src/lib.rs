//! Last-price lookups behind [`analysis_core::QuoteSource`].

pub mod fixed;
pub mod yahoo_finance;

pub use fixed::FixedQuote;
pub use yahoo_finance::{parse_last_price, YahooFinanceClient};
