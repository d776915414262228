//! IRR calculation entry points
//!
//! Resolves a request (single fund, fund set, or whole portfolio on a date)
//! into classify → aggregate → solve. Calculations are pure functions of the
//! ledger snapshot; nothing is cached and nothing is written back.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cashflow::{aggregate, classify_all};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::holdings::{partition, AggregateHolding};
use crate::irr::{solve, IrrResult, IrrStatus, RateRecord};
use crate::ledger::{FundId, Holding, LedgerSource, PortfolioId};

/// Per-fund outcome in a bulk run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// One fund's slot in a [`BulkResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundOutcome {
    pub fund_id: FundId,
    pub status: OutcomeStatus,
    /// Converged rate, or the approximate one for `NoConvergence`
    pub rate_percent: Option<f64>,
    pub irr_status: Option<IrrStatus>,
    pub message: String,
}

impl FundOutcome {
    fn from_result(fund_id: FundId, result: &IrrResult) -> Self {
        let (status, message) = match result.status {
            IrrStatus::Ok => (OutcomeStatus::Success, "IRR calculated".to_string()),
            IrrStatus::InsufficientData => (
                OutcomeStatus::Error,
                "Insufficient cash-flow data for an IRR".to_string(),
            ),
            IrrStatus::NoConvergence => (
                OutcomeStatus::Error,
                format!(
                    "IRR did not converge; approximate rate {:.4}%",
                    result.rate_percent.unwrap_or(f64::NAN)
                ),
            ),
        };

        Self {
            fund_id,
            status,
            rate_percent: result.rate_percent,
            irr_status: Some(result.status),
            message,
        }
    }

    fn from_error(fund_id: FundId, err: &EngineError) -> Self {
        Self {
            fund_id,
            status: OutcomeStatus::Error,
            rate_percent: None,
            irr_status: None,
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Result of a date-targeted portfolio run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    pub portfolio_id: PortfolioId,
    pub date: NaiveDate,

    /// One entry per fund that had a valuation on `date`, in registry order
    pub results: Vec<FundOutcome>,

    /// Funds without a valuation dated exactly `date`
    pub missing: Vec<FundId>,

    pub successful: usize,
    pub failed: usize,
    /// Funds calculated (`successful + failed`)
    pub total: usize,

    /// Sum of `date` valuations over active funds only
    pub active_total_value: f64,

    /// Rollup of inactive holdings, for display
    pub inactive_aggregate: Option<AggregateHolding>,

    /// Fund-set IRR over every fund that had a valuation
    pub combined: IrrResult,
}

impl BulkResult {
    /// Converged per-fund rates, ready for the caller to store
    pub fn rate_records(&self) -> Vec<RateRecord> {
        self.results
            .iter()
            .filter(|o| o.is_success())
            .filter_map(|o| {
                Some(RateRecord {
                    fund_id: o.fund_id,
                    date: self.date,
                    rate_percent: o.rate_percent?,
                })
            })
            .collect()
    }
}

/// Terminal valuation resolved for a calculation
struct Terminal {
    value: f64,
    date: NaiveDate,
}

/// IRR calculator over a read-only ledger
///
/// # Example
/// ```ignore
/// let snapshot = load_snapshot("data/sample")?;
/// let calculator = IrrCalculator::new(&snapshot);
///
/// let fund = calculator.calculate_single_fund(1, None)?;
/// let bulk = calculator.calculate_for_date(1, date)?;
/// ```
pub struct IrrCalculator<'a, S: LedgerSource + ?Sized> {
    source: &'a S,
    config: EngineConfig,
}

impl<'a, S: LedgerSource + ?Sized> IrrCalculator<'a, S> {
    /// Create a calculator with default conventions
    pub fn new(source: &'a S) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    pub fn with_config(source: &'a S, config: EngineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// IRR over one fund's full history.
    ///
    /// With an as-of date the fund needs a valuation dated exactly that day
    /// and only activity up to it counts. Without one the whole ledger
    /// counts and the calculation ends at the later of the latest valuation
    /// and the last activity.
    pub fn calculate_single_fund(
        &self,
        fund_id: FundId,
        as_of: Option<NaiveDate>,
    ) -> Result<IrrResult, EngineError> {
        self.calculate(&[fund_id], as_of).map_err(|err| match err {
            EngineError::MissingValuations { fund_ids, date } if fund_ids.len() == 1 => {
                EngineError::MissingValuation {
                    fund_id: fund_ids[0],
                    date,
                }
            }
            other => other,
        })
    }

    /// IRR over several funds treated as one pot: contributions are merged
    /// before monthly netting and the terminal value is the sum of the
    /// funds' valuations.
    pub fn calculate_fund_set(
        &self,
        fund_ids: &[FundId],
        as_of: Option<NaiveDate>,
    ) -> Result<IrrResult, EngineError> {
        self.calculate(fund_ids, as_of)
    }

    /// Per-fund IRR for every holding in a portfolio valued on `date`.
    ///
    /// Funds without a valuation dated exactly `date` are listed in
    /// `missing`; every other fund gets its own independent outcome.
    pub fn calculate_for_date(
        &self,
        portfolio_id: PortfolioId,
        date: NaiveDate,
    ) -> Result<BulkResult, EngineError> {
        let holdings = self.source.holdings(portfolio_id);
        if holdings.is_empty() {
            return Err(EngineError::EmptyPortfolio(portfolio_id));
        }

        let split = partition(&holdings);

        let mut included = Vec::new();
        let mut missing = Vec::new();
        let mut active_total_value = 0.0;

        for holding in &holdings {
            match self.source.valuation_on(holding.fund_id, date) {
                Some(valuation) => {
                    if holding.is_active() {
                        active_total_value += valuation.value;
                    }
                    included.push(holding.fund_id);
                }
                None => missing.push(holding.fund_id),
            }
        }

        if !missing.is_empty() {
            log::warn!(
                "Portfolio {}: no valuation on {} for funds {:?}",
                portfolio_id,
                date,
                missing
            );
        }

        let results: Vec<FundOutcome> = included
            .par_iter()
            .map(|&fund_id| match self.calculate(&[fund_id], Some(date)) {
                Ok(result) => FundOutcome::from_result(fund_id, &result),
                Err(err) => FundOutcome::from_error(fund_id, &err),
            })
            .collect();

        let successful = results.iter().filter(|o| o.is_success()).count();
        let failed = results.len() - successful;

        let combined = if included.is_empty() {
            IrrResult::insufficient_data(Some(date))
        } else {
            self.calculate(&included, Some(date))
                .unwrap_or_else(|err| {
                    log::warn!("Portfolio {}: combined IRR failed: {}", portfolio_id, err);
                    IrrResult::insufficient_data(Some(date))
                })
        };

        log::info!(
            "Portfolio {} on {}: {} succeeded, {} failed, {} missing",
            portfolio_id,
            date,
            successful,
            failed,
            missing.len()
        );

        Ok(BulkResult {
            portfolio_id,
            date,
            total: results.len(),
            results,
            missing,
            successful,
            failed,
            active_total_value,
            inactive_aggregate: split.aggregate,
            combined,
        })
    }

    fn calculate(
        &self,
        fund_ids: &[FundId],
        as_of: Option<NaiveDate>,
    ) -> Result<IrrResult, EngineError> {
        let mut ids: Vec<FundId> = Vec::with_capacity(fund_ids.len());
        for &id in fund_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(EngineError::EmptyFundSet);
        }
        if let Some(&unknown) = ids.iter().find(|&&id| self.source.holding(id).is_none()) {
            return Err(EngineError::UnknownFund(unknown));
        }

        let terminal = match as_of {
            Some(date) => self.terminal_on(&ids, date)?,
            None => match self.latest_terminal(&ids) {
                Some(terminal) => terminal,
                None => {
                    log::debug!("Funds {:?}: no valuations and no activity", ids);
                    return Ok(IrrResult::insufficient_data(None));
                }
            },
        };

        let records = self.source.activities(&ids, Some(terminal.date));
        let classified = classify_all(&records);
        let flows = aggregate(
            &classified.contributions,
            terminal.value,
            terminal.date,
            self.config.anchor_day,
        );

        let solution = solve(&flows, &self.config.solver)?;
        Ok(IrrResult::from_solution(solution, Some(terminal.date)))
    }

    /// Sum of valuations dated exactly `date`; every fund must have one
    fn terminal_on(&self, ids: &[FundId], date: NaiveDate) -> Result<Terminal, EngineError> {
        let mut value = 0.0;
        let mut missing = Vec::new();

        for &id in ids {
            match self.source.valuation_on(id, date) {
                Some(v) => value += v.value,
                None => missing.push(id),
            }
        }

        if !missing.is_empty() {
            return Err(EngineError::MissingValuations {
                fund_ids: missing,
                date,
            });
        }

        Ok(Terminal { value, date })
    }

    /// Terminal value for a full-history calculation.
    ///
    /// Ends at the later of the latest valuation and the last activity across
    /// the funds. A fund's latest valuation counts only when no activity was
    /// posted after it; otherwise the registry market value stands in (zero
    /// for an inactive fund). Funds never valued count as zero.
    fn latest_terminal(&self, ids: &[FundId]) -> Option<Terminal> {
        let mut value = 0.0;
        let mut date: Option<NaiveDate> = None;

        for &id in ids {
            let last_activity = self
                .source
                .activities(&[id], None)
                .iter()
                .map(|a| a.timestamp)
                .max();
            let valuation = self.source.latest_valuation(id);

            date = date
                .max(last_activity)
                .max(valuation.map(|v| v.valuation_date));

            match valuation {
                Some(v) if last_activity.map_or(true, |d| d <= v.valuation_date) => {
                    value += v.value;
                }
                Some(v) => {
                    let fallback = self.registry_value(id);
                    log::warn!(
                        "Fund {}: activity after latest valuation on {}, using registry value {}",
                        id,
                        v.valuation_date,
                        fallback
                    );
                    value += fallback;
                }
                None => log::debug!("Fund {}: no valuation, counting as zero", id),
            }
        }

        Some(Terminal { value, date: date? })
    }

    /// Registry market value, zero for inactive funds
    fn registry_value(&self, fund_id: FundId) -> f64 {
        self.source
            .holding(fund_id)
            .filter(Holding::is_active)
            .map_or(0.0, |h| h.market_value)
    }
}
