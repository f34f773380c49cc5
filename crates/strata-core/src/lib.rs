//! Core types for the Strata constraint solver.
//!
//! This crate provides the value types shared by the solver and its callers:
//! - Variables and the caller-owned arena that stores their values
//! - Immutable linear expressions over variables
//! - Constraints with relations and strengths
//! - Error types
//! - Optional debug formatting

pub mod constraint;
pub mod errors;
pub mod expression;
pub mod format;
pub mod strength;
pub mod variable;

pub use constraint::*;
pub use errors::*;
pub use expression::*;
pub use strength::*;
pub use variable::*;
