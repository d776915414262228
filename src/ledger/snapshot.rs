//! Read-only ledger access
//!
//! The engine never owns ledger storage. Callers hand it something that
//! implements [`LedgerSource`]; [`LedgerSnapshot`] is the in-memory version
//! used by the CLI and the tests.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::{ActivityRecord, FundId, Holding, PortfolioId, Valuation};

/// Immutable view of ledger, valuations and holding registry.
///
/// Implementations must be safe to share across the rayon pool.
pub trait LedgerSource: Sync {
    /// Activity records for the given funds, in timestamp order, optionally
    /// bounded to `timestamp <= until`.
    fn activities(&self, fund_ids: &[FundId], until: Option<NaiveDate>) -> Vec<ActivityRecord>;

    /// Valuation dated exactly `date`
    fn valuation_on(&self, fund_id: FundId, date: NaiveDate) -> Option<Valuation>;

    /// Most recent valuation for a fund
    fn latest_valuation(&self, fund_id: FundId) -> Option<Valuation>;

    fn holding(&self, fund_id: FundId) -> Option<Holding>;

    /// All holdings registered under a portfolio, in registry order
    fn holdings(&self, portfolio_id: PortfolioId) -> Vec<Holding>;
}

/// In-memory ledger snapshot
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    activities: Vec<ActivityRecord>,
    /// fund -> (date -> value)
    valuations: HashMap<FundId, BTreeMap<NaiveDate, f64>>,
    holdings: Vec<Holding>,
}

impl LedgerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from loaded parts
    pub fn from_parts(
        activities: Vec<ActivityRecord>,
        valuations: Vec<Valuation>,
        holdings: Vec<Holding>,
    ) -> Self {
        let mut snapshot = Self::new();
        for activity in activities {
            snapshot.add_activity(activity);
        }
        for valuation in valuations {
            snapshot.add_valuation(valuation);
        }
        for holding in holdings {
            snapshot.add_holding(holding);
        }
        snapshot
    }

    pub fn add_activity(&mut self, activity: ActivityRecord) {
        // Stable insert keeps same-day postings in arrival order
        let idx = self
            .activities
            .partition_point(|a| a.timestamp <= activity.timestamp);
        self.activities.insert(idx, activity);
    }

    /// Add a valuation. A second valuation for the same fund and date replaces the first.
    pub fn add_valuation(&mut self, valuation: Valuation) {
        self.valuations
            .entry(valuation.fund_id)
            .or_default()
            .insert(valuation.valuation_date, valuation.value);
    }

    /// Register a holding. Re-registering a fund replaces the previous entry.
    pub fn add_holding(&mut self, holding: Holding) {
        match self.holdings.iter_mut().find(|h| h.fund_id == holding.fund_id) {
            Some(existing) => *existing = holding,
            None => self.holdings.push(holding),
        }
    }

    pub fn all_holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn valuation_count(&self) -> usize {
        self.valuations.values().map(BTreeMap::len).sum()
    }
}

impl LedgerSource for LedgerSnapshot {
    fn activities(&self, fund_ids: &[FundId], until: Option<NaiveDate>) -> Vec<ActivityRecord> {
        self.activities
            .iter()
            .filter(|a| fund_ids.contains(&a.fund_id))
            .filter(|a| until.map_or(true, |d| a.timestamp <= d))
            .cloned()
            .collect()
    }

    fn valuation_on(&self, fund_id: FundId, date: NaiveDate) -> Option<Valuation> {
        self.valuations
            .get(&fund_id)
            .and_then(|by_date| by_date.get(&date))
            .map(|&value| Valuation::new(fund_id, value, date))
    }

    fn latest_valuation(&self, fund_id: FundId) -> Option<Valuation> {
        self.valuations
            .get(&fund_id)
            .and_then(|by_date| by_date.iter().next_back())
            .map(|(&date, &value)| Valuation::new(fund_id, value, date))
    }

    fn holding(&self, fund_id: FundId) -> Option<Holding> {
        self.holdings.iter().find(|h| h.fund_id == fund_id).cloned()
    }

    fn holdings(&self, portfolio_id: PortfolioId) -> Vec<Holding> {
        self.holdings
            .iter()
            .filter(|h| h.portfolio_id == portfolio_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_activities_sorted_and_bounded() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.add_activity(ActivityRecord::new(1, date(2024, 5, 1), "Investment", 100.0));
        snapshot.add_activity(ActivityRecord::new(2, date(2024, 1, 1), "Investment", 50.0));
        snapshot.add_activity(ActivityRecord::new(1, date(2024, 2, 1), "Withdrawal", 10.0));

        let fund_1 = snapshot.activities(&[1], None);
        assert_eq!(fund_1.len(), 2);
        assert_eq!(fund_1[0].timestamp, date(2024, 2, 1));

        let bounded = snapshot.activities(&[1, 2], Some(date(2024, 3, 1)));
        assert_eq!(bounded.len(), 2);
        assert!(bounded.iter().all(|a| a.timestamp <= date(2024, 3, 1)));
    }

    #[test]
    fn test_valuation_lookup() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.add_valuation(Valuation::new(1, 900.0, date(2024, 1, 31)));
        snapshot.add_valuation(Valuation::new(1, 950.0, date(2024, 2, 29)));

        assert_eq!(snapshot.valuation_on(1, date(2024, 1, 31)).unwrap().value, 900.0);
        assert!(snapshot.valuation_on(1, date(2024, 1, 30)).is_none());
        assert_eq!(snapshot.latest_valuation(1).unwrap().value, 950.0);
        assert!(snapshot.latest_valuation(2).is_none());
    }

    #[test]
    fn test_holdings_by_portfolio() {
        let mut snapshot = LedgerSnapshot::new();
        snapshot.add_holding(Holding::new(1, 10));
        snapshot.add_holding(Holding::new(2, 20));
        snapshot.add_holding(Holding::new(3, 10).with_status("inactive"));

        let ids: Vec<FundId> = snapshot.holdings(10).iter().map(|h| h.fund_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(snapshot.holding(4).is_none());
    }
}
