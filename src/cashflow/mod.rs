//! Ledger classification and monthly cash-flow aggregation

mod classifier;
mod aggregator;

pub use classifier::{
    category_of, classify, classify_all, raw_totals, ClassifiedLedger, Contribution, FlowCategory,
};
pub use aggregator::{aggregate, CashFlow, NET_ZERO_EPSILON};
