//! Incremental linear constraint solving.
//!
//! This crate implements the Cassowary algorithm:
//! - Required and prioritised constraints (strong, medium, weak) with weights
//! - Incremental addition and removal without re-solving from scratch
//! - Edit sessions for repeatedly moving a few variables
//! - Stays that keep under-determined variables where they were
//!
//! ```
//! use strata_solver::{Constraint, Relation, Solver, Variables};
//!
//! let mut vars = Variables::new();
//! let left = vars.new_variable("left", 0.0);
//! let right = vars.new_variable("right", 0.0);
//!
//! let mut solver = Solver::new();
//! solver.add_constraint(&Constraint::equation(left - 10.0))?;
//! solver.add_constraint(&Constraint::inequality(right - left - 20.0, Relation::GreaterOrEqual))?;
//! solver.solve(&mut vars)?;
//!
//! assert!((vars[right] - 30.0).abs() < 1e-6);
//! # Ok::<(), strata_solver::SolverError>(())
//! ```

mod config;
mod invariants;
mod row;
mod solver;
mod symbol;
mod tableau;
mod weight;

pub use config::SolverConfig;
pub use solver::Solver;
pub use strata_core::{
    format, ArithmeticError, Constraint, Expression, Relation, SolverError, StrataError, Strength,
    Variable, Variables,
};
