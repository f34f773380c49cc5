//! Tableau consistency checks.

use strata_core::SolverError;

use crate::solver::Solver;

fn violation(message: impl Into<String>) -> SolverError {
    SolverError::InternalInvariantViolation(message.into())
}

impl Solver {
    /// Verify the tableau is in a consistent, feasible and optimal state.
    ///
    /// Runs automatically after every operation when
    /// [`SolverConfig::verify_invariants`](crate::SolverConfig) is set.
    pub fn check_invariants(&self) -> Result<(), SolverError> {
        let tableau = &self.tableau;
        let epsilon = tableau.epsilon();

        if tableau.has_artificial() {
            return Err(violation("artificial objective left behind"));
        }

        for (basic, row) in tableau.rows() {
            if let Some((symbol, _)) = row.cells().find(|&(s, _)| tableau.is_basic(s)) {
                return Err(violation(format!(
                    "row {} references basic symbol {}",
                    basic.id(),
                    symbol.id()
                )));
            }
            if basic.is_restricted() && row.constant < -self.config.tolerance_for(0.0) {
                return Err(violation(format!(
                    "restricted row {} is infeasible ({})",
                    basic.id(),
                    row.constant
                )));
            }
        }

        if let Some((symbol, _)) = tableau
            .objective()
            .cells()
            .find(|&(s, _)| tableau.is_basic(s))
        {
            return Err(violation(format!(
                "objective references basic symbol {}",
                symbol.id()
            )));
        }
        if let Some(symbol) = tableau.objective().entering_symbol(epsilon) {
            return Err(violation(format!(
                "objective is not optimal, symbol {} can enter",
                symbol.id()
            )));
        }

        for constraint in self.constraints.keys().filter(|c| c.is_required()) {
            let magnitude = constraint.expression().constant_value().abs()
                + constraint
                    .expression()
                    .terms()
                    .map(|(var, coeff)| (coeff * self.value(var)).abs())
                    .sum::<f64>();
            let tolerance = self.config.tolerance_for(magnitude);
            if !constraint.is_satisfied(|var| self.value(var), tolerance) {
                return Err(violation(format!(
                    "required {} constraint is violated",
                    constraint.relation()
                )));
            }
        }

        Ok(())
    }
}
