//! Money-weighted Internal Rate of Return (IRR) solver
//!
//! Newton-Raphson on the dated NPV equation, Actual/365 time basis:
//!
//! ```text
//! t_i     = days(d_i - d_0) / 365
//! NPV(r)  = Σ a_i / (1 + r)^t_i
//! NPV'(r) = Σ -t_i · a_i / (1 + r)^(t_i + 1)
//! r_{n+1} = r_n - NPV(r_n) / NPV'(r_n)
//! ```

use crate::cashflow::CashFlow;
use crate::config::SolverConfig;
use crate::error::EngineError;

use super::IrrStatus;

/// Raw solver output, before it is tied to an as-of date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Annual rate as a decimal (0.10 = 10%)
    pub rate: Option<f64>,
    pub status: IrrStatus,
    pub iterations: u32,
}

impl Solution {
    fn insufficient() -> Self {
        Self {
            rate: None,
            status: IrrStatus::InsufficientData,
            iterations: 0,
        }
    }
}

/// Year fractions from the first flow date
fn year_fractions(flows: &[CashFlow]) -> Vec<f64> {
    let first = flows[0].date;
    flows
        .iter()
        .map(|f| (f.date - first).num_days() as f64 / 365.0)
        .collect()
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(flows: &[CashFlow], times: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (flow, &t) in flows.iter().zip(times) {
        npv += flow.amount / (1.0 + rate).powf(t);
        dnpv -= t * flow.amount / (1.0 + rate).powf(t + 1.0);
    }

    (npv, dnpv)
}

/// NPV of dated cash flows at an annual rate (Actual/365 from the first flow)
pub fn npv(flows: &[CashFlow], rate: f64) -> f64 {
    if flows.is_empty() {
        return 0.0;
    }
    let times = year_fractions(flows);
    npv_and_derivative(flows, &times, rate).0
}

/// Reject lists that are not strictly date-ascending
fn check_order(flows: &[CashFlow]) -> Result<(), EngineError> {
    for (index, pair) in flows.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            return Err(EngineError::UnorderedCashflows {
                index: index + 1,
                previous: pair[0].date,
                current: pair[1].date,
            });
        }
    }
    Ok(())
}

/// Solve for the annual IRR of a date-ascending cash-flow list.
///
/// Fewer than two flows, or flows without both a strictly negative and a
/// strictly positive entry, give `InsufficientData` with no rate. A step
/// that turns non-finite stops the iteration and returns the last rate at
/// which NPV evaluated cleanly, tagged `NoConvergence`. Running out of
/// iterations returns the final rate with the same tag.
///
/// Unordered or duplicate-date input is a caller defect and fails fast.
pub fn solve(flows: &[CashFlow], config: &SolverConfig) -> Result<Solution, EngineError> {
    check_order(flows)?;

    if flows.len() < 2 {
        return Ok(Solution::insufficient());
    }

    let has_positive = flows.iter().any(|f| f.amount > 0.0);
    let has_negative = flows.iter().any(|f| f.amount < 0.0);
    if !has_positive || !has_negative {
        return Ok(Solution::insufficient());
    }

    let times = year_fractions(flows);
    let mut rate = config.initial_guess;
    // Last rate whose NPV and derivative were finite
    let mut last_clean = rate;

    for iteration in 0..config.max_iterations {
        let (npv, dnpv) = npv_and_derivative(flows, &times, rate);

        if !npv.is_finite() || !dnpv.is_finite() {
            log::warn!(
                "IRR: NPV non-finite at rate {} after {} iterations, keeping {}",
                rate,
                iteration,
                last_clean
            );
            return Ok(no_convergence(last_clean, iteration));
        }
        last_clean = rate;

        if npv.abs() < config.tolerance {
            log::debug!("IRR: converged to {} in {} iterations", rate, iteration);
            return Ok(Solution {
                rate: Some(rate),
                status: IrrStatus::Ok,
                iterations: iteration,
            });
        }

        let new_rate = rate - npv / dnpv;
        if !new_rate.is_finite() {
            log::warn!("IRR: update non-finite at rate {} (dNPV = {})", rate, dnpv);
            return Ok(no_convergence(rate, iteration));
        }

        rate = new_rate;
    }

    // Budget spent; the last update may still have landed on the root
    let (npv, dnpv) = npv_and_derivative(flows, &times, rate);
    if !npv.is_finite() || !dnpv.is_finite() {
        return Ok(no_convergence(last_clean, config.max_iterations));
    }
    if npv.abs() < config.tolerance {
        return Ok(Solution {
            rate: Some(rate),
            status: IrrStatus::Ok,
            iterations: config.max_iterations,
        });
    }

    log::warn!(
        "IRR: no convergence after {} iterations, last rate {}",
        config.max_iterations,
        rate
    );
    Ok(no_convergence(rate, config.max_iterations))
}

fn no_convergence(rate: f64, iterations: u32) -> Solution {
    Solution {
        rate: Some(rate),
        status: IrrStatus::NoConvergence,
        iterations,
    }
}
