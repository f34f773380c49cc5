//! Error types for the Strata solver.

use thiserror::Error;

use crate::variable::Variable;

/// Top-level error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrataError {
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Errors from malformed expression arithmetic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArithmeticError {
    #[error("Division of an expression by zero")]
    DivisionByZero,

    #[error("Division of an expression by non-finite value {0}")]
    NonFiniteDivisor(f64),

    #[error("Multiplication of an expression by non-finite value {0}")]
    NonFiniteScalar(f64),
}

/// Errors raised by solver operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("The required constraints cannot be satisfied together")]
    RequiredFailure,

    #[error("The constraint is not active in the solver")]
    UnknownConstraint,

    #[error("The constraint has already been added to the solver")]
    DuplicateConstraint,

    #[error("Variable {0} is not being edited")]
    UnknownEditVariable(Variable),

    #[error("Variable {0} is already being edited")]
    DuplicateEditVariable(Variable),

    #[error("No edit session is active")]
    NoActiveEdit,

    #[error("Invalid constraint weight {0}: weights must be finite and above the solver epsilon")]
    InvalidWeight(f64),

    #[error("Non-finite value {0} in constraint or edit target")]
    NonFiniteValue(f64),

    #[error("Optimisation did not converge after {pivots} pivots")]
    NonConvergence { pivots: usize },

    #[error("Internal solver invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl SolverError {
    /// Fatal errors indicate a solver defect rather than a usage error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SolverError::NonConvergence { .. } | SolverError::InternalInvariantViolation(_)
        )
    }
}
