//! Activity classification
//!
//! Maps each ledger entry to a signed contribution using the investor's
//! point of view: money entering the fund is a cost (negative), money
//! leaving the fund is a return (positive).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::{ActivityRecord, ActivityType, FundId};

/// Canonical bucket every recognised activity type falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowCategory {
    /// Investment, regular investment, government uplift, switch-ins
    InvestmentLike,
    /// Withdrawal, regular withdrawal, switch-outs
    WithdrawalLike,
}

impl FlowCategory {
    pub fn sign(&self) -> f64 {
        match self {
            FlowCategory::InvestmentLike => -1.0,
            FlowCategory::WithdrawalLike => 1.0,
        }
    }
}

/// Category for an activity type, `None` for unrecognised types
pub fn category_of(activity_type: &ActivityType) -> Option<FlowCategory> {
    match activity_type {
        ActivityType::Investment
        | ActivityType::RegularInvestment
        | ActivityType::GovernmentUplift
        | ActivityType::FundSwitchIn
        | ActivityType::ProductSwitchIn => Some(FlowCategory::InvestmentLike),
        ActivityType::Withdrawal
        | ActivityType::RegularWithdrawal
        | ActivityType::FundSwitchOut
        | ActivityType::ProductSwitchOut => Some(FlowCategory::WithdrawalLike),
        ActivityType::Unrecognized(_) => None,
    }
}

/// A classified, signed ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub fund_id: FundId,
    pub date: NaiveDate,
    pub activity_type: ActivityType,
    pub category: FlowCategory,
    pub signed_amount: f64,
}

/// Classify a single record.
///
/// The recorded amount is taken as a magnitude, so `-100` and `100` posted
/// under the same type classify identically. Unrecognised types return `None`
/// and are logged as ignored.
pub fn classify(record: &ActivityRecord) -> Option<Contribution> {
    let Some(category) = category_of(&record.activity_type) else {
        log::info!(
            "Ignoring activity type '{}' for fund {} on {}",
            record.activity_type,
            record.fund_id,
            record.timestamp
        );
        return None;
    };

    Some(Contribution {
        fund_id: record.fund_id,
        date: record.timestamp,
        activity_type: record.activity_type.clone(),
        category,
        signed_amount: category.sign() * record.amount.abs(),
    })
}

/// Result of classifying a batch of ledger entries
#[derive(Debug, Clone, Default)]
pub struct ClassifiedLedger {
    pub contributions: Vec<Contribution>,
    /// Records with unrecognised types. Excluded from cash flows only.
    pub ignored: Vec<ActivityRecord>,
}

impl ClassifiedLedger {
    /// Classified magnitude per activity type
    pub fn totals_by_type(&self) -> BTreeMap<ActivityType, f64> {
        let mut totals = BTreeMap::new();
        for c in &self.contributions {
            *totals.entry(c.activity_type.clone()).or_insert(0.0) += c.signed_amount.abs();
        }
        totals
    }

    /// Money put into the funds (positive number)
    pub fn total_invested(&self) -> f64 {
        self.category_total(FlowCategory::InvestmentLike)
    }

    /// Money taken out of the funds (positive number)
    pub fn total_withdrawn(&self) -> f64 {
        self.category_total(FlowCategory::WithdrawalLike)
    }

    fn category_total(&self, category: FlowCategory) -> f64 {
        self.contributions
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.signed_amount.abs())
            .sum()
    }
}

/// Classify every record, keeping unrecognised ones aside
pub fn classify_all(records: &[ActivityRecord]) -> ClassifiedLedger {
    let mut ledger = ClassifiedLedger::default();

    for record in records {
        match classify(record) {
            Some(contribution) => ledger.contributions.push(contribution),
            None => ledger.ignored.push(record.clone()),
        }
    }

    ledger
}

/// Raw magnitude per activity type, recognised or not
pub fn raw_totals(records: &[ActivityRecord]) -> BTreeMap<ActivityType, f64> {
    let mut totals = BTreeMap::new();
    for r in records {
        *totals.entry(r.activity_type.clone()).or_insert(0.0) += r.amount.abs();
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(activity_type: &str, amount: f64) -> ActivityRecord {
        ActivityRecord::new(
            1,
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            activity_type,
            amount,
        )
    }

    #[test]
    fn test_investment_like_is_negative() {
        for label in [
            "Investment",
            "RegularInvestment",
            "GovernmentUplift",
            "FundSwitchIn",
            "ProductSwitchIn",
        ] {
            let c = classify(&record(label, 200.0)).unwrap();
            assert_eq!(c.category, FlowCategory::InvestmentLike, "{}", label);
            assert_eq!(c.signed_amount, -200.0, "{}", label);
        }
    }

    #[test]
    fn test_withdrawal_like_is_positive() {
        for label in [
            "Withdrawal",
            "RegularWithdrawal",
            "FundSwitchOut",
            "ProductSwitchOut",
        ] {
            let c = classify(&record(label, 75.0)).unwrap();
            assert_eq!(c.category, FlowCategory::WithdrawalLike, "{}", label);
            assert_eq!(c.signed_amount, 75.0, "{}", label);
        }
    }

    #[test]
    fn test_recorded_sign_is_ignored() {
        let negative = classify(&record("Withdrawal", -300.0)).unwrap();
        let positive = classify(&record("Withdrawal", 300.0)).unwrap();
        assert_eq!(negative, positive);

        let negative = classify(&record("Investment", -300.0)).unwrap();
        assert_eq!(negative.signed_amount, -300.0);
    }

    #[test]
    fn test_unknown_type_is_ignored_not_dropped() {
        let records = vec![
            record("Investment", 1000.0),
            record("Fee", 25.0),
            record("Withdrawal", 100.0),
        ];
        let ledger = classify_all(&records);

        assert_eq!(ledger.contributions.len(), 2);
        assert_eq!(ledger.ignored.len(), 1);

        // Still visible in raw ledger totals
        let raw = raw_totals(&records);
        assert_eq!(raw[&ActivityType::Unrecognized("Fee".to_string())], 25.0);
    }

    #[test]
    fn test_classification_is_lossless() {
        let records = vec![
            record("Investment", 1000.0),
            record("Investment", -250.5),
            record("Regular Investment", 100.0),
            record("Government Uplift", 25.0),
            record("Switch In", 300.0),
            record("Product Switch In", 40.0),
            record("Withdrawal", -60.0),
            record("Regular Withdrawal", 10.0),
            record("Fund Switch Out", 300.0),
            record("Product Switch Out", 12.25),
            record("Dividend", 9.0),
        ];

        let ledger = classify_all(&records);
        let classified = ledger.totals_by_type();
        let raw = raw_totals(&records);

        for activity_type in ActivityType::KNOWN.iter() {
            assert_relative_eq!(
                classified.get(activity_type).copied().unwrap_or(0.0),
                raw.get(activity_type).copied().unwrap_or(0.0)
            );
        }

        let raw_recognised: f64 = raw
            .iter()
            .filter(|(t, _)| t.is_recognized())
            .map(|(_, v)| v)
            .sum();
        assert_relative_eq!(
            ledger.total_invested() + ledger.total_withdrawn(),
            raw_recognised
        );
        assert_relative_eq!(ledger.total_invested(), 1715.5);
        assert_relative_eq!(ledger.total_withdrawn(), 382.25);
    }
}
