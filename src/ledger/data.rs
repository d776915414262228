//! Ledger data structures: activity records, holdings and valuations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a fund holding
pub type FundId = u32;

/// Identifier of a portfolio (or product) grouping holdings
pub type PortfolioId = u32;

/// Categorical tag on a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Investment,
    RegularInvestment,
    GovernmentUplift,
    FundSwitchIn,
    ProductSwitchIn,
    Withdrawal,
    RegularWithdrawal,
    FundSwitchOut,
    ProductSwitchOut,
    /// Any label outside the known set, kept verbatim
    Unrecognized(String),
}

impl ActivityType {
    /// Every recognised type, in ledger display order
    pub const KNOWN: [ActivityType; 9] = [
        ActivityType::Investment,
        ActivityType::RegularInvestment,
        ActivityType::GovernmentUplift,
        ActivityType::FundSwitchIn,
        ActivityType::ProductSwitchIn,
        ActivityType::Withdrawal,
        ActivityType::RegularWithdrawal,
        ActivityType::FundSwitchOut,
        ActivityType::ProductSwitchOut,
    ];

    /// Parse a ledger label. Case, spaces, underscores and hyphens are ignored.
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "investment" => ActivityType::Investment,
            "regularinvestment" => ActivityType::RegularInvestment,
            "governmentuplift" => ActivityType::GovernmentUplift,
            "fundswitchin" | "switchin" => ActivityType::FundSwitchIn,
            "productswitchin" => ActivityType::ProductSwitchIn,
            "withdrawal" => ActivityType::Withdrawal,
            "regularwithdrawal" => ActivityType::RegularWithdrawal,
            "fundswitchout" | "switchout" => ActivityType::FundSwitchOut,
            "productswitchout" => ActivityType::ProductSwitchOut,
            _ => ActivityType::Unrecognized(label.trim().to_string()),
        }
    }

    /// Canonical ledger label
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Investment => "Investment",
            ActivityType::RegularInvestment => "RegularInvestment",
            ActivityType::GovernmentUplift => "GovernmentUplift",
            ActivityType::FundSwitchIn => "FundSwitchIn",
            ActivityType::ProductSwitchIn => "ProductSwitchIn",
            ActivityType::Withdrawal => "Withdrawal",
            ActivityType::RegularWithdrawal => "RegularWithdrawal",
            ActivityType::FundSwitchOut => "FundSwitchOut",
            ActivityType::ProductSwitchOut => "ProductSwitchOut",
            ActivityType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ActivityType::Unrecognized(_))
    }
}

impl From<&str> for ActivityType {
    fn from(label: &str) -> Self {
        ActivityType::parse(label)
    }
}

impl From<String> for ActivityType {
    fn from(label: String) -> Self {
        ActivityType::parse(&label)
    }
}

impl From<ActivityType> for String {
    fn from(activity_type: ActivityType) -> Self {
        activity_type.as_str().to_string()
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One posted ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub fund_id: FundId,

    /// Date the activity was posted for
    pub timestamp: NaiveDate,

    pub activity_type: ActivityType,

    /// Magnitude as recorded; sign is not trusted
    pub amount: f64,
}

impl ActivityRecord {
    pub fn new(
        fund_id: FundId,
        timestamp: NaiveDate,
        activity_type: impl Into<ActivityType>,
        amount: f64,
    ) -> Self {
        Self {
            fund_id,
            timestamp,
            activity_type: activity_type.into(),
            amount,
        }
    }
}

/// Market value of a fund on a given date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub fund_id: FundId,
    pub value: f64,
    pub valuation_date: NaiveDate,
}

impl Valuation {
    pub fn new(fund_id: FundId, value: f64, valuation_date: NaiveDate) -> Self {
        Self {
            fund_id,
            value,
            valuation_date,
        }
    }
}

/// Routing status of a holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldingStatus {
    Active,
    Inactive,
}

impl HoldingStatus {
    /// Normalise a registry status string.
    ///
    /// Only `inactive` (any case, surrounding whitespace ignored) routes a fund
    /// out of the active set; unset or unexpected values stay active.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("inactive") => HoldingStatus::Inactive,
            _ => HoldingStatus::Active,
        }
    }
}

/// A fund position as reported by the holding registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub fund_id: FundId,

    pub portfolio_id: PortfolioId,

    /// Raw registry status; see [`Holding::status`]
    #[serde(default)]
    pub status: Option<String>,

    pub amount_invested: f64,

    pub market_value: f64,

    #[serde(default)]
    pub valuation_date: Option<NaiveDate>,

    /// Informational only
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Informational only; never used to route active/inactive
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Holding {
    pub fn new(fund_id: FundId, portfolio_id: PortfolioId) -> Self {
        Self {
            fund_id,
            portfolio_id,
            status: None,
            amount_invested: 0.0,
            market_value: 0.0,
            valuation_date: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_amounts(mut self, amount_invested: f64, market_value: f64) -> Self {
        self.amount_invested = amount_invested;
        self.market_value = market_value;
        self
    }

    pub fn status(&self) -> HoldingStatus {
        HoldingStatus::from_raw(self.status.as_deref())
    }

    pub fn is_active(&self) -> bool {
        self.status() == HoldingStatus::Active
    }
}
