//! Ledger data structures, read-only ledger access and CSV snapshot loading

mod data;
mod snapshot;
pub mod loader;

pub use data::{
    ActivityRecord, ActivityType, FundId, Holding, HoldingStatus, PortfolioId, Valuation,
};
pub use loader::load_snapshot;
pub use snapshot::{LedgerSnapshot, LedgerSource};
