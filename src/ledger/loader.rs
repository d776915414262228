//! Load a ledger snapshot from CSV files
//!
//! A snapshot directory holds three files:
//! - `activities.csv`: FundID, Date, ActivityType, Amount
//! - `valuations.csv`: FundID, Value, ValuationDate
//! - `holdings.csv`:   FundID, PortfolioID, Status, AmountInvested, MarketValue,
//!                     ValuationDate, StartDate, EndDate

use chrono::NaiveDate;
use csv::Reader;
use std::collections::HashSet;
use std::path::Path;

use super::{ActivityRecord, FundId, Holding, LedgerSnapshot, PortfolioId, Valuation};
use crate::error::LoadError;

pub const ACTIVITIES_FILE: &str = "activities.csv";
pub const VALUATIONS_FILE: &str = "valuations.csv";
pub const HOLDINGS_FILE: &str = "holdings.csv";

#[derive(Debug, serde::Deserialize)]
struct ActivityRow {
    #[serde(rename = "FundID")]
    fund_id: FundId,
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "ActivityType")]
    activity_type: String,
    #[serde(rename = "Amount")]
    amount: f64,
}

impl ActivityRow {
    fn to_record(self) -> ActivityRecord {
        ActivityRecord::new(self.fund_id, self.date, self.activity_type, self.amount)
    }
}

#[derive(Debug, serde::Deserialize)]
struct ValuationRow {
    #[serde(rename = "FundID")]
    fund_id: FundId,
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "ValuationDate")]
    valuation_date: NaiveDate,
}

#[derive(Debug, serde::Deserialize)]
struct HoldingRow {
    #[serde(rename = "FundID")]
    fund_id: FundId,
    #[serde(rename = "PortfolioID")]
    portfolio_id: PortfolioId,
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "AmountInvested")]
    amount_invested: Option<f64>,
    #[serde(rename = "MarketValue")]
    market_value: Option<f64>,
    #[serde(rename = "ValuationDate")]
    valuation_date: Option<NaiveDate>,
    #[serde(rename = "StartDate")]
    start_date: Option<NaiveDate>,
    #[serde(rename = "EndDate")]
    end_date: Option<NaiveDate>,
}

impl HoldingRow {
    fn to_holding(self) -> Holding {
        Holding {
            fund_id: self.fund_id,
            portfolio_id: self.portfolio_id,
            status: self.status.filter(|s| !s.trim().is_empty()),
            amount_invested: self.amount_invested.unwrap_or(0.0),
            market_value: self.market_value.unwrap_or(0.0),
            valuation_date: self.valuation_date,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Load activity records from any reader
pub fn load_activities_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<ActivityRecord>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ActivityRow = result?;
        records.push(row.to_record());
    }

    Ok(records)
}

/// Load valuations from any reader
pub fn load_valuations_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<Valuation>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut valuations = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ValuationRow = result?;
        valuations.push(Valuation::new(row.fund_id, row.value, row.valuation_date));
    }

    Ok(valuations)
}

/// Load holdings from any reader. A fund may only be registered once.
pub fn load_holdings_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Holding>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut holdings = Vec::new();
    let mut seen = HashSet::new();

    for result in csv_reader.deserialize() {
        let row: HoldingRow = result?;
        if !seen.insert(row.fund_id) {
            return Err(LoadError::DuplicateHolding(row.fund_id));
        }
        holdings.push(row.to_holding());
    }

    Ok(holdings)
}

/// Load a full snapshot from a directory of CSV files
pub fn load_snapshot<P: AsRef<Path>>(dir: P) -> Result<LedgerSnapshot, LoadError> {
    let dir = dir.as_ref();
    std::fs::metadata(dir).map_err(|source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let activities = load_activities_from_reader(open(&dir.join(ACTIVITIES_FILE))?)?;
    let valuations = load_valuations_from_reader(open(&dir.join(VALUATIONS_FILE))?)?;
    let holdings = load_holdings_from_reader(open(&dir.join(HOLDINGS_FILE))?)?;

    log::debug!(
        "Loaded {} activities, {} valuations, {} holdings from {}",
        activities.len(),
        valuations.len(),
        holdings.len(),
        dir.display()
    );

    Ok(LedgerSnapshot::from_parts(activities, valuations, holdings))
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ActivityType, HoldingStatus, LedgerSource};

    #[test]
    fn test_load_activities() {
        let data = "FundID,Date,ActivityType,Amount\n\
                    1,2023-01-15,Investment,5000\n\
                    1,2023-06-02,Regular Withdrawal,-120.5\n\
                    2,2023-02-01,Fee,10\n";
        let records = load_activities_from_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].activity_type, ActivityType::Investment);
        assert_eq!(records[1].activity_type, ActivityType::RegularWithdrawal);
        assert_eq!(records[1].amount, -120.5);
        assert_eq!(
            records[2].activity_type,
            ActivityType::Unrecognized("Fee".to_string())
        );
    }

    #[test]
    fn test_load_holdings_with_blank_fields() {
        let data = "FundID,PortfolioID,Status,AmountInvested,MarketValue,ValuationDate,StartDate,EndDate\n\
                    1,10,active,5000,5500,2024-01-15,2023-01-15,\n\
                    2,10,,1000,,,,\n\
                    3,10,Inactive,2000,0,2023-12-31,2022-01-01,2023-12-31\n";
        let holdings = load_holdings_from_reader(data.as_bytes()).unwrap();

        assert_eq!(holdings.len(), 3);
        assert_eq!(holdings[1].status, None);
        assert_eq!(holdings[1].market_value, 0.0);
        assert_eq!(holdings[1].status(), HoldingStatus::Active);
        assert_eq!(holdings[2].status(), HoldingStatus::Inactive);
        assert!(holdings[0].end_date.is_none());
    }

    #[test]
    fn test_duplicate_holding_rejected() {
        let data = "FundID,PortfolioID,Status,AmountInvested,MarketValue,ValuationDate,StartDate,EndDate\n\
                    1,10,active,5000,5500,,,\n\
                    1,10,active,5000,5500,,,\n";
        let err = load_holdings_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateHolding(1)));
    }

    #[test]
    fn test_snapshot_from_loaded_parts() {
        let valuations = "FundID,Value,ValuationDate\n1,5500,2024-01-15\n";
        let valuations = load_valuations_from_reader(valuations.as_bytes()).unwrap();
        let snapshot = LedgerSnapshot::from_parts(Vec::new(), valuations, Vec::new());

        let latest = snapshot.latest_valuation(1).unwrap();
        assert_eq!(latest.value, 5500.0);
        assert_eq!(latest.valuation_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_load_sample_snapshot() {
        let snapshot = load_snapshot("data/sample").expect("Failed to load sample snapshot");
        assert_eq!(snapshot.activity_count(), 13);
        assert_eq!(snapshot.valuation_count(), 4);
        assert_eq!(snapshot.all_holdings().len(), 4);

        let closed = snapshot.holding(2).unwrap();
        assert_eq!(closed.status(), HoldingStatus::Inactive);
    }

    #[test]
    fn test_missing_directory() {
        let err = load_snapshot("definitely/not/a/snapshot/dir").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
