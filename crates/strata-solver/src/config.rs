//! Solver configuration.

use strata_core::Strength;

/// Options for the solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Coefficients and constants with magnitude below this count as zero
    pub epsilon: f64,
    /// Pivot limit for a single optimisation pass
    pub max_pivots: usize,
    /// Add a stay at the caller's value for every unanchored variable on solve
    pub implicit_stays: bool,
    /// Strength used for implicit stays
    pub stay_strength: Strength,
    /// Check tableau invariants after every public operation
    pub verify_invariants: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-8,
            max_pivots: 10_000,
            implicit_stays: true,
            stay_strength: Strength::Weak,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

impl SolverConfig {
    /// Tolerance for checking a constraint against solved values, scaled by
    /// the magnitude of its expression.
    pub(crate) fn tolerance_for(&self, magnitude: f64) -> f64 {
        self.epsilon * (1.0 + magnitude).max(100.0)
    }
}
