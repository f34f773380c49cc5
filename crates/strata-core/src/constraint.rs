//! Linear constraints.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::expression::Expression;
use crate::strength::Strength;
use crate::variable::Variable;

/// The relation of a constraint (equality or inequality) against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::LessOrEqual => "<=",
            Relation::Equal => "==",
            Relation::GreaterOrEqual => ">=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint `expression OP 0` with a strength and a weight within that
/// strength.
///
/// Constraints are immutable values. Two constraints are equal when their
/// normalized expression, relation and strength are equal; the weight does
/// not take part.
#[derive(Debug, Clone)]
pub struct Constraint {
    expression: Expression,
    relation: Relation,
    strength: Strength,
    weight: f64,
}

impl Constraint {
    /// Create a new constraint with weight 1.
    pub fn new(expression: Expression, relation: Relation, strength: Strength) -> Self {
        Self {
            expression,
            relation,
            strength,
            weight: 1.0,
        }
    }

    /// Required equation `expression == 0`.
    pub fn equation(expression: Expression) -> Self {
        Self::new(expression, Relation::Equal, Strength::Required)
    }

    /// Required inequality `expression OP 0`.
    pub fn inequality(expression: Expression, relation: Relation) -> Self {
        Self::new(expression, relation, Strength::Required)
    }

    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = strength;
        self
    }

    /// Set the weight within the strength tier. Validated by the solver.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_required(&self) -> bool {
        self.strength.is_required()
    }

    /// Check the constraint against variable values within `tolerance`.
    pub fn is_satisfied(&self, value_of: impl FnMut(Variable) -> f64, tolerance: f64) -> bool {
        let value = self.expression.evaluate(value_of);
        match self.relation {
            Relation::Equal => value.abs() <= tolerance,
            Relation::LessOrEqual => value <= tolerance,
            Relation::GreaterOrEqual => value >= -tolerance,
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
            && self.relation == other.relation
            && self.strength == other.strength
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expression.hash(state);
        self.relation.hash(state);
        self.strength.hash(state);
    }
}
