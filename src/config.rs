//! Engine configuration
//!
//! Defaults reproduce the house IRR conventions. Every value can be
//! overridden from the environment:
//!   IRR_INITIAL_GUESS, IRR_MAX_ITERATIONS, IRR_TOLERANCE, IRR_ANCHOR_DAY

use serde::{Deserialize, Serialize};
use std::env;

/// Default Newton-Raphson starting rate (5% annual)
pub const DEFAULT_INITIAL_GUESS: f64 = 0.05;

/// Hard iteration ceiling for the solver
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// |NPV| below which the solver stops
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Day of month every netted monthly flow is dated to
pub const DEFAULT_ANCHOR_DAY: u32 = 15;

/// Newton-Raphson settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Annual rate the iteration starts from (0.05 = 5%)
    pub initial_guess: f64,

    /// Maximum number of Newton steps
    pub max_iterations: u32,

    /// Convergence threshold on |NPV|
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_INITIAL_GUESS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Configuration for an [`IrrCalculator`](crate::IrrCalculator)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub solver: SolverConfig,

    /// Day of month used to date netted monthly cash flows.
    /// Clamped to the last day of short months.
    pub anchor_day: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            anchor_day: DEFAULT_ANCHOR_DAY,
        }
    }
}

impl EngineConfig {
    /// Build a config from `IRR_*` environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Out-of-range values fall back to
    /// the defaults. The iteration budget is capped at
    /// [`DEFAULT_MAX_ITERATIONS`]. The starting rate must be finite and above
    /// -100%. The tolerance must be positive and finite. The anchor day must
    /// lie in 1..=31.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let initial_guess: f64 = lookup("IRR_INITIAL_GUESS")
            .and_then(|s| s.parse().ok())
            .filter(|g: &f64| g.is_finite() && *g > -1.0)
            .unwrap_or(defaults.solver.initial_guess);

        let max_iterations: u32 = lookup("IRR_MAX_ITERATIONS")
            .and_then(|s| s.parse().ok())
            .map(|n: u32| n.min(DEFAULT_MAX_ITERATIONS))
            .unwrap_or(defaults.solver.max_iterations);

        let tolerance: f64 = lookup("IRR_TOLERANCE")
            .and_then(|s| s.parse().ok())
            .filter(|t: &f64| t.is_finite() && *t > 0.0)
            .unwrap_or(defaults.solver.tolerance);

        let anchor_day: u32 = lookup("IRR_ANCHOR_DAY")
            .and_then(|s| s.parse().ok())
            .filter(|d| (1..=31).contains(d))
            .unwrap_or(defaults.anchor_day);

        Self {
            solver: SolverConfig {
                initial_guess,
                max_iterations,
                tolerance,
            },
            anchor_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.anchor_day, 15);
        assert_eq!(config.solver.max_iterations, 100);
        assert_eq!(config.solver.initial_guess, 0.05);
        assert_eq!(config.solver.tolerance, 1e-6);
    }

    #[test]
    fn test_overrides_within_range_are_used() {
        let config = from_pairs(&[
            ("IRR_INITIAL_GUESS", "0.1"),
            ("IRR_MAX_ITERATIONS", "50"),
            ("IRR_TOLERANCE", "1e-8"),
            ("IRR_ANCHOR_DAY", "1"),
        ]);
        assert_eq!(config.solver.initial_guess, 0.1);
        assert_eq!(config.solver.max_iterations, 50);
        assert_eq!(config.solver.tolerance, 1e-8);
        assert_eq!(config.anchor_day, 1);
    }

    #[test]
    fn test_out_of_range_overrides_fall_back() {
        let config = from_pairs(&[
            ("IRR_INITIAL_GUESS", "NaN"),
            ("IRR_MAX_ITERATIONS", "4000000000"),
            ("IRR_TOLERANCE", "-1"),
            ("IRR_ANCHOR_DAY", "32"),
        ]);
        assert_eq!(config.solver.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.solver.initial_guess, DEFAULT_INITIAL_GUESS);
        assert_eq!(config.solver.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.anchor_day, DEFAULT_ANCHOR_DAY);

        for bad in ["0", "inf", "NaN"] {
            let config = from_pairs(&[("IRR_TOLERANCE", bad)]);
            assert_eq!(config.solver.tolerance, DEFAULT_TOLERANCE, "tolerance {}", bad);
        }
    }

    #[test]
    fn test_unparsable_overrides_fall_back() {
        let config = from_pairs(&[("IRR_MAX_ITERATIONS", "-5"), ("IRR_ANCHOR_DAY", "mid")]);
        assert_eq!(config, EngineConfig::default());
    }
}
