//! Fund IRR - money-weighted rate of return engine for fund ledgers
//!
//! This library provides:
//! - Activity classification into signed cash-flow contributions
//! - Monthly netting of contributions with a terminal valuation
//! - Newton-Raphson IRR on dated cash flows (Actual/365)
//! - Active/inactive holding partition with an inactive-fund rollup
//! - Single fund, fund set and portfolio-on-a-date calculations

pub mod cashflow;
pub mod config;
pub mod error;
pub mod holdings;
pub mod irr;
pub mod ledger;
pub mod orchestrator;

// Re-export commonly used types
pub use config::{EngineConfig, SolverConfig};
pub use error::{EngineError, LoadError};
pub use holdings::{partition, AggregateHolding, Partition, PortfolioEntry};
pub use irr::{IrrResult, IrrStatus, RateRecord};
pub use ledger::{ActivityRecord, ActivityType, Holding, LedgerSnapshot, LedgerSource, Valuation};
pub use orchestrator::{BulkResult, FundOutcome, IrrCalculator, OutcomeStatus};
