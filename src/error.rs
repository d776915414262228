//! Error types for the IRR engine and snapshot loading

use chrono::NaiveDate;
use thiserror::Error;

use crate::ledger::{FundId, PortfolioId};

/// Errors raised by a calculation request.
///
/// Data conditions such as "no sign change" or "did not converge" are not
/// errors; they come back as an [`IrrStatus`](crate::irr::IrrStatus).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Cash flows handed to the solver were not strictly date-ascending.
    #[error("cash flow {index} dated {current} does not follow {previous}")]
    UnorderedCashflows {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("fund {fund_id} has no valuation dated {date}")]
    MissingValuation { fund_id: FundId, date: NaiveDate },

    #[error("funds {fund_ids:?} have no valuation dated {date}")]
    MissingValuations {
        fund_ids: Vec<FundId>,
        date: NaiveDate,
    },

    #[error("unknown fund {0}")]
    UnknownFund(FundId),

    #[error("portfolio {0} has no holdings")]
    EmptyPortfolio(PortfolioId),

    #[error("no funds requested")]
    EmptyFundSet,
}

/// Errors raised while loading a ledger snapshot from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("duplicate holding for fund {0}")]
    DuplicateHolding(FundId),
}
