//! Active/inactive holding partition
//!
//! Inactive funds are rolled up into one synthetic [`AggregateHolding`] for
//! display continuity. The rollup carries totals only: it has no fund id,
//! so it can never be handed to the calculator, and its rate is always
//! unavailable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::{FundId, Holding};

/// Synthetic rollup of inactive holdings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateHolding {
    /// Real funds the rollup stands for
    pub member_ids: Vec<FundId>,
    pub amount_invested: f64,
    pub market_value: f64,
    pub valuation_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AggregateHolding {
    /// Sum the members. `None` when there are no members.
    pub fn from_members(members: &[Holding]) -> Option<Self> {
        if members.is_empty() {
            return None;
        }

        Some(Self {
            member_ids: members.iter().map(|h| h.fund_id).collect(),
            amount_invested: members.iter().map(|h| h.amount_invested).sum(),
            market_value: members.iter().map(|h| h.market_value).sum(),
            valuation_date: members.iter().filter_map(|h| h.valuation_date).max(),
            start_date: members.iter().filter_map(|h| h.start_date).max(),
            end_date: members.iter().filter_map(|h| h.end_date).max(),
        })
    }

    /// A combined rate over closed funds would be misleading, so there is none
    pub fn rate_percent(&self) -> Option<f64> {
        None
    }
}

/// Row shown in a holdings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortfolioEntry {
    Real(Holding),
    Aggregate(AggregateHolding),
}

impl PortfolioEntry {
    /// Fund id to calculate for; the rollup has none
    pub fn fund_id(&self) -> Option<FundId> {
        match self {
            PortfolioEntry::Real(h) => Some(h.fund_id),
            PortfolioEntry::Aggregate(_) => None,
        }
    }

    pub fn amount_invested(&self) -> f64 {
        match self {
            PortfolioEntry::Real(h) => h.amount_invested,
            PortfolioEntry::Aggregate(a) => a.amount_invested,
        }
    }

    pub fn market_value(&self) -> f64 {
        match self {
            PortfolioEntry::Real(h) => h.market_value,
            PortfolioEntry::Aggregate(a) => a.market_value,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, PortfolioEntry::Aggregate(_))
    }
}

/// Holdings split by status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub active: Vec<Holding>,
    pub inactive: Vec<Holding>,
    pub aggregate: Option<AggregateHolding>,
}

impl Partition {
    /// Active holdings in registry order, then the inactive rollup if any
    pub fn display_rows(&self) -> Vec<PortfolioEntry> {
        let mut rows: Vec<PortfolioEntry> =
            self.active.iter().cloned().map(PortfolioEntry::Real).collect();
        if let Some(aggregate) = &self.aggregate {
            rows.push(PortfolioEntry::Aggregate(aggregate.clone()));
        }
        rows
    }

    pub fn active_total_value(&self) -> f64 {
        self.active.iter().map(|h| h.market_value).sum()
    }

    /// Invested across every holding, active and inactive
    pub fn total_invested(&self) -> f64 {
        self.active.iter().map(|h| h.amount_invested).sum::<f64>()
            + self.aggregate.as_ref().map_or(0.0, |a| a.amount_invested)
    }

    pub fn active_fund_ids(&self) -> Vec<FundId> {
        self.active.iter().map(|h| h.fund_id).collect()
    }

    /// Ids for a "previous funds" fund-set calculation
    pub fn inactive_fund_ids(&self) -> Vec<FundId> {
        self.inactive.iter().map(|h| h.fund_id).collect()
    }
}

/// Split holdings by status and roll up the inactive ones
pub fn partition(holdings: &[Holding]) -> Partition {
    let (active, inactive): (Vec<Holding>, Vec<Holding>) =
        holdings.iter().cloned().partition(Holding::is_active);

    let aggregate = AggregateHolding::from_members(&inactive);

    log::debug!(
        "Partitioned {} holdings: {} active, {} inactive",
        holdings.len(),
        active.len(),
        inactive.len()
    );

    Partition {
        active,
        inactive,
        aggregate,
    }
}
