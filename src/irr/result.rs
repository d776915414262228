//! IRR result records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::solver::Solution;
use crate::ledger::FundId;

/// Outcome tag carried by every IRR result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrStatus {
    Ok,
    /// No rate is meaningful: fewer than two flows, or no sign change
    InsufficientData,
    /// Best estimate returned, tolerance not reached
    NoConvergence,
}

/// Money-weighted rate of return for a fund or fund set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrResult {
    /// Annual rate in percent (10.0 = 10%)
    pub rate_percent: Option<f64>,

    /// Date the terminal valuation was taken
    pub as_of_date: Option<NaiveDate>,

    pub status: IrrStatus,

    /// Newton steps used
    pub iterations: u32,
}

impl IrrResult {
    pub fn from_solution(solution: Solution, as_of_date: Option<NaiveDate>) -> Self {
        Self {
            rate_percent: solution.rate.map(|r| r * 100.0),
            as_of_date,
            status: solution.status,
            iterations: solution.iterations,
        }
    }

    pub fn insufficient_data(as_of_date: Option<NaiveDate>) -> Self {
        Self {
            rate_percent: None,
            as_of_date,
            status: IrrStatus::InsufficientData,
            iterations: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == IrrStatus::Ok
    }

    /// Record suitable for persisting. Only converged results qualify.
    pub fn rate_record(&self, fund_id: FundId) -> Option<RateRecord> {
        if !self.is_ok() {
            return None;
        }
        Some(RateRecord {
            fund_id,
            date: self.as_of_date?,
            rate_percent: self.rate_percent?,
        })
    }
}

/// A converged rate the caller may store so it need not be recomputed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    #[serde(rename = "FundID")]
    pub fund_id: FundId,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "RatePercent")]
    pub rate_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(rate: Option<f64>, status: IrrStatus) -> Solution {
        Solution {
            rate,
            status,
            iterations: 4,
        }
    }

    #[test]
    fn test_rate_converted_to_percent() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let result = IrrResult::from_solution(solution(Some(0.1), IrrStatus::Ok), date);
        assert_eq!(result.rate_percent, Some(10.0));
        assert_eq!(result.as_of_date, date);
    }

    #[test]
    fn test_only_ok_results_are_persistable() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15);

        let ok = IrrResult::from_solution(solution(Some(0.1), IrrStatus::Ok), date);
        let record = ok.rate_record(3).unwrap();
        assert_eq!(record.fund_id, 3);
        assert_eq!(record.rate_percent, 10.0);

        let approx = IrrResult::from_solution(solution(Some(0.3), IrrStatus::NoConvergence), date);
        assert!(approx.rate_record(3).is_none());
        assert!(IrrResult::insufficient_data(date).rate_record(3).is_none());
    }

    #[test]
    fn test_status_serialises_snake_case() {
        let json = serde_json::to_string(&IrrStatus::InsufficientData).unwrap();
        assert_eq!(json, "\"insufficient_data\"");
    }
}
