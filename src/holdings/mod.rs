//! Holding partition and inactive-fund rollup

mod partition;

pub use partition::{partition, AggregateHolding, Partition, PortfolioEntry};
