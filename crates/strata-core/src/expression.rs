//! Immutable linear expressions.
//!
//! An expression is a constant plus a sparse map from variable to
//! coefficient. Every operation returns a new expression; a coefficient that
//! cancels to exactly zero is dropped from the map.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};

use crate::constraint::{Constraint, Relation};
use crate::errors::ArithmeticError;
use crate::variable::Variable;

/// A linear expression in the form: constant + Σ(coefficient * variable)
#[derive(Debug, Clone, Default)]
pub struct Expression {
    constant: f64,
    terms: BTreeMap<Variable, f64>,
}

impl Expression {
    /// Create a constant expression.
    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: BTreeMap::new(),
        }
    }

    /// Create an expression from a single variable.
    pub fn from_variable(var: Variable) -> Self {
        Self::from_term(var, 1.0)
    }

    /// Create an expression `coefficient * var`.
    pub fn from_term(var: Variable, coefficient: f64) -> Self {
        let mut terms = BTreeMap::new();
        if coefficient != 0.0 {
            terms.insert(var, coefficient);
        }
        Self {
            constant: 0.0,
            terms,
        }
    }

    /// The constant offset.
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// Get the coefficient for a variable (zero when absent).
    pub fn coefficient(&self, var: Variable) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Iterate over the non-zero terms in variable id order.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(&var, &coeff)| (var, coeff))
    }

    /// Iterate over the variables referenced by this expression.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms.keys().copied()
    }

    /// Check if the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// `self + other`
    pub fn plus(&self, other: &Expression) -> Expression {
        self.combine(other, 1.0)
    }

    /// `self - other`
    pub fn minus(&self, other: &Expression) -> Expression {
        self.combine(other, -1.0)
    }

    /// `self * scalar`
    pub fn times(&self, scalar: f64) -> Result<Expression, ArithmeticError> {
        if !scalar.is_finite() {
            return Err(ArithmeticError::NonFiniteScalar(scalar));
        }
        Ok(self.scale(scalar))
    }

    fn scale(&self, scalar: f64) -> Expression {
        let terms = self
            .terms
            .iter()
            .map(|(&var, &coeff)| (var, coeff * scalar))
            .filter(|&(_, coeff)| coeff != 0.0)
            .collect();
        Expression {
            constant: self.constant * scalar,
            terms,
        }
    }

    /// `self / scalar`
    pub fn divide(&self, scalar: f64) -> Result<Expression, ArithmeticError> {
        if scalar == 0.0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        if !scalar.is_finite() {
            return Err(ArithmeticError::NonFiniteDivisor(scalar));
        }
        Ok(self.scale(1.0 / scalar))
    }

    /// `-self`
    pub fn negate(&self) -> Expression {
        self.scale(-1.0)
    }

    /// Whether the constant and every coefficient are finite.
    pub fn is_finite(&self) -> bool {
        self.constant.is_finite() && self.terms.values().all(|c| c.is_finite())
    }

    /// Evaluate the expression with the given variable values.
    pub fn evaluate(&self, mut value_of: impl FnMut(Variable) -> f64) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, (&var, &coeff)| acc + coeff * value_of(var))
    }

    /// Constraint `self == rhs`, normalized to `self - rhs == 0`.
    pub fn equal_to(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::equation(self.minus(&rhs.into()))
    }

    /// Constraint `self <= rhs`, normalized to `self - rhs <= 0`.
    pub fn less_or_equal(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::inequality(self.minus(&rhs.into()), Relation::LessOrEqual)
    }

    /// Constraint `self >= rhs`, normalized to `self - rhs >= 0`.
    pub fn greater_or_equal(&self, rhs: impl Into<Expression>) -> Constraint {
        Constraint::inequality(self.minus(&rhs.into()), Relation::GreaterOrEqual)
    }

    fn combine(&self, other: &Expression, multiplier: f64) -> Expression {
        let mut terms = self.terms.clone();
        for (&var, &coeff) in &other.terms {
            let entry = terms.entry(var).or_insert(0.0);
            *entry += coeff * multiplier;
            if *entry == 0.0 {
                terms.remove(&var);
            }
        }
        Expression {
            constant: self.constant + other.constant * multiplier,
            terms,
        }
    }
}

/// Bit pattern used for structural equality; folds `-0.0` into `0.0`.
pub(crate) fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        canonical_bits(self.constant) == canonical_bits(other.constant)
            && self.terms.len() == other.terms.len()
            && self
                .terms
                .iter()
                .zip(&other.terms)
                .all(|((va, ca), (vb, cb))| va == vb && canonical_bits(*ca) == canonical_bits(*cb))
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_bits(self.constant).hash(state);
        self.terms.len().hash(state);
        for (var, coeff) in &self.terms {
            var.hash(state);
            canonical_bits(*coeff).hash(state);
        }
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Expression::from_variable(var)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::constant(value)
    }
}

impl Add<Expression> for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        self.plus(&rhs)
    }
}

impl Add<Variable> for Expression {
    type Output = Expression;

    fn add(self, rhs: Variable) -> Expression {
        self.plus(&Expression::from_variable(rhs))
    }
}

impl Add<f64> for Expression {
    type Output = Expression;

    fn add(self, rhs: f64) -> Expression {
        self.plus(&Expression::constant(rhs))
    }
}

impl Sub<Expression> for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        self.minus(&rhs)
    }
}

impl Sub<Variable> for Expression {
    type Output = Expression;

    fn sub(self, rhs: Variable) -> Expression {
        self.minus(&Expression::from_variable(rhs))
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Expression {
        self.minus(&Expression::constant(rhs))
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    /// Unchecked scaling; a non-finite factor yields an expression the
    /// solver rejects. Use [`Expression::times`] to catch it here.
    fn mul(self, rhs: f64) -> Expression {
        self.scale(rhs)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.negate()
    }
}

impl Add<Variable> for Variable {
    type Output = Expression;

    fn add(self, rhs: Variable) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl Add<Expression> for Variable {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl Add<f64> for Variable {
    type Output = Expression;

    fn add(self, rhs: f64) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl Sub<Variable> for Variable {
    type Output = Expression;

    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Sub<Expression> for Variable {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Sub<f64> for Variable {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::from_term(self, rhs)
    }
}

impl Neg for Variable {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::from_term(self, -1.0)
    }
}
