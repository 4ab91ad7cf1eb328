//! Discounted cash flow valuation over a fixed historical window.
//!
//! [`DcfEngine`] runs the pure pipeline: statement reconciliation, driver
//! extrapolation, statement projection, free cash flow and discounting.

pub mod config;
pub mod consistency;
pub mod drivers;
pub mod engine;
pub mod history;
pub mod projection;
pub mod valuation;

pub use config::{ValuationConfig, VariableNames};
pub use consistency::ConsistencyChecker;
pub use drivers::{Driver, DriverPaths, MarginSet};
pub use engine::{DcfEngine, DcfReport};
pub use history::HistoricalStatements;
pub use projection::Projection;
pub use valuation::{signal, CapitalClaims, PresentValues};
