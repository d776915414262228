//! Monthly cash-flow aggregation
//!
//! Contributions are netted per calendar month and dated to a fixed anchor
//! day so several postings in one month do not add day-count noise. The
//! terminal valuation is appended as a final positive flow.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classifier::Contribution;

/// Netted amounts smaller than this are treated as exactly zero
pub const NET_ZERO_EPSILON: f64 = 1e-9;

/// A dated, signed cash flow fed to the solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Anchor date for a month, clamped to the month's last day
fn anchor_date(year: i32, month: u32, anchor_day: u32) -> Option<NaiveDate> {
    (1..=anchor_day.clamp(1, 31))
        .rev()
        .find_map(|day| NaiveDate::from_ymd_opt(year, month, day))
}

/// Aggregate contributions into a strictly date-ascending list of cash flows.
///
/// Contributions dated after `as_of` are outside the calculation window and
/// are skipped. An anchor date past `as_of` is pulled back to `as_of`, and a
/// monthly flow landing on `as_of` absorbs the terminal value, so the output
/// never holds two flows on one date.
///
/// A zero terminal value is never appended. A negative one (a liability left
/// at the end) is appended only when other flows exist, so with no
/// contributions and a non-positive terminal value the result is empty.
pub fn aggregate(
    contributions: &[Contribution],
    terminal_value: f64,
    as_of: NaiveDate,
    anchor_day: u32,
) -> Vec<CashFlow> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    for c in contributions {
        if c.date > as_of {
            log::debug!(
                "Skipping fund {} contribution on {} after as-of {}",
                c.fund_id,
                c.date,
                as_of
            );
            continue;
        }
        *by_month.entry((c.date.year(), c.date.month())).or_insert(0.0) += c.signed_amount;
    }

    let mut flows: Vec<CashFlow> = Vec::with_capacity(by_month.len() + 1);

    for ((year, month), net) in by_month {
        if net.abs() < NET_ZERO_EPSILON {
            continue;
        }
        let Some(anchor) = anchor_date(year, month, anchor_day) else {
            continue;
        };
        flows.push(CashFlow::new(anchor.min(as_of), net));
    }

    let has_terminal = terminal_value > 0.0 || (terminal_value < 0.0 && !flows.is_empty());
    if has_terminal {
        match flows.last_mut() {
            Some(last) if last.date == as_of => last.amount += terminal_value,
            _ => flows.push(CashFlow::new(as_of, terminal_value)),
        }
    }

    flows.retain(|f| f.amount.abs() >= NET_ZERO_EPSILON);

    log::debug!("Aggregated {} cash flows up to {}", flows.len(), as_of);
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::classifier::classify_all;
    use crate::ledger::ActivityRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contributions(records: &[(NaiveDate, &str, f64)]) -> Vec<Contribution> {
        let records: Vec<ActivityRecord> = records
            .iter()
            .map(|&(d, t, a)| ActivityRecord::new(1, d, t, a))
            .collect();
        classify_all(&records).contributions
    }

    #[test]
    fn test_monthly_netting_and_anchor() {
        let cs = contributions(&[
            (date(2023, 1, 3), "Investment", 1000.0),
            (date(2023, 1, 28), "Investment", 500.0),
            (date(2023, 3, 9), "Withdrawal", 200.0),
        ]);
        let flows = aggregate(&cs, 1400.0, date(2023, 12, 31), 15);

        assert_eq!(
            flows,
            vec![
                CashFlow::new(date(2023, 1, 15), -1500.0),
                CashFlow::new(date(2023, 3, 15), 200.0),
                CashFlow::new(date(2023, 12, 31), 1400.0),
            ]
        );
    }

    #[test]
    fn test_offsetting_month_produces_no_flow() {
        let cs = contributions(&[
            (date(2023, 1, 10), "Investment", 1000.0),
            (date(2023, 5, 2), "Fund Switch In", 300.0),
            (date(2023, 5, 20), "Fund Switch Out", 300.0),
        ]);
        let flows = aggregate(&cs, 1100.0, date(2024, 1, 10), 15);

        assert_eq!(flows.len(), 2);
        assert!(flows.iter().all(|f| f.date.month() != 5));
    }

    #[test]
    fn test_empty_when_nothing_to_aggregate() {
        assert!(aggregate(&[], 0.0, date(2024, 1, 1), 15).is_empty());
        assert!(aggregate(&[], -10.0, date(2024, 1, 1), 15).is_empty());
    }

    #[test]
    fn test_zero_terminal_value_not_appended() {
        let cs = contributions(&[
            (date(2023, 1, 10), "Investment", 1000.0),
            (date(2023, 8, 10), "Withdrawal", 1050.0),
        ]);
        let flows = aggregate(&cs, 0.0, date(2023, 12, 31), 15);
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[1].date, date(2023, 8, 15));
    }

    #[test]
    fn test_negative_terminal_value_appended_after_flows() {
        let cs = contributions(&[
            (date(2023, 1, 10), "Investment", 1000.0),
            (date(2023, 8, 10), "Withdrawal", 1200.0),
        ]);
        let flows = aggregate(&cs, -50.0, date(2023, 12, 31), 15);

        assert_eq!(
            flows,
            vec![
                CashFlow::new(date(2023, 1, 15), -1000.0),
                CashFlow::new(date(2023, 8, 15), 1200.0),
                CashFlow::new(date(2023, 12, 31), -50.0),
            ]
        );
    }

    #[test]
    fn test_anchor_clamped_to_as_of_and_merged() {
        let cs = contributions(&[
            (date(2023, 1, 10), "Investment", 1000.0),
            (date(2024, 1, 2), "Investment", 100.0),
        ]);
        let flows = aggregate(&cs, 1200.0, date(2024, 1, 10), 15);

        assert_eq!(
            flows,
            vec![
                CashFlow::new(date(2023, 1, 15), -1000.0),
                CashFlow::new(date(2024, 1, 10), 1100.0),
            ]
        );
        assert!(flows.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_contributions_after_as_of_are_skipped() {
        let cs = contributions(&[
            (date(2023, 1, 10), "Investment", 1000.0),
            (date(2023, 9, 1), "Investment", 400.0),
        ]);
        let flows = aggregate(&cs, 1050.0, date(2023, 6, 30), 15);
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].amount, -1000.0);
    }

    #[test]
    fn test_anchor_day_clamped_in_short_month() {
        let cs = contributions(&[(date(2023, 2, 3), "Investment", 100.0)]);
        let flows = aggregate(&cs, 120.0, date(2024, 2, 3), 31);
        assert_eq!(flows[0].date, date(2023, 2, 28));
    }
}
