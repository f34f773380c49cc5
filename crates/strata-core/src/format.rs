//! Debug formatting for variables, expressions and constraints.
//!
//! Output is cosmetic only; nothing in the solver compares or parses it.

use std::fmt;

use crate::constraint::Constraint;
use crate::expression::Expression;
use crate::variable::{Variable, Variables};

/// Formats a variable as `name = value`.
pub struct VariableDisplay<'a> {
    vars: &'a Variables,
    var: Variable,
}

/// Formats an expression using variable names from an arena.
pub struct ExpressionDisplay<'a> {
    vars: &'a Variables,
    expr: &'a Expression,
}

/// Formats a constraint as `expression OP 0`.
pub struct ConstraintDisplay<'a> {
    vars: &'a Variables,
    constraint: &'a Constraint,
}

pub fn variable<'a>(vars: &'a Variables, var: Variable) -> VariableDisplay<'a> {
    VariableDisplay { vars, var }
}

pub fn expression<'a>(vars: &'a Variables, expr: &'a Expression) -> ExpressionDisplay<'a> {
    ExpressionDisplay { vars, expr }
}

pub fn constraint<'a>(vars: &'a Variables, constraint: &'a Constraint) -> ConstraintDisplay<'a> {
    ConstraintDisplay { vars, constraint }
}

fn write_name(f: &mut fmt::Formatter<'_>, vars: &Variables, var: Variable) -> fmt::Result {
    match vars.name(var) {
        Some(name) if !name.is_empty() => f.write_str(name),
        _ => write!(f, "{}", var),
    }
}

impl fmt::Display for VariableDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(f, self.vars, self.var)?;
        match self.vars.get(self.var) {
            Some(value) => write!(f, " = {}", value),
            None => f.write_str(" = ?"),
        }
    }
}

impl fmt::Display for ExpressionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (var, coeff) in self.expr.terms() {
            let magnitude = coeff.abs();
            match (first, coeff < 0.0) {
                (true, true) => f.write_str("-")?,
                (true, false) => {}
                (false, true) => f.write_str(" - ")?,
                (false, false) => f.write_str(" + ")?,
            }
            if magnitude != 1.0 {
                write!(f, "{} * ", magnitude)?;
            }
            write_name(f, self.vars, var)?;
            first = false;
        }

        let constant = self.expr.constant_value();
        if first {
            write!(f, "{}", constant)
        } else if constant < 0.0 {
            write!(f, " - {}", -constant)
        } else if constant > 0.0 {
            write!(f, " + {}", constant)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ConstraintDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} 0",
            expression(self.vars, self.constraint.expression()),
            self.constraint.relation()
        )?;
        if !self.constraint.is_required() {
            write!(f, " | {}", self.constraint.strength())?;
            if self.constraint.weight() != 1.0 {
                write!(f, " x{}", self.constraint.weight())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Relation, Strength};

    #[test]
    fn test_variable_display() {
        let mut vars = Variables::new();
        let x = vars.new_variable("a.left", 10.0);
        assert_eq!(variable(&vars, x).to_string(), "a.left = 10");
    }

    #[test]
    fn test_expression_display() {
        let mut vars = Variables::new();
        let a = vars.new_variable("a", 0.0);
        let b = vars.new_variable("b", 0.0);

        let e = a - b - 10.0;
        assert_eq!(expression(&vars, &e).to_string(), "a - b - 10");

        let e = -(a * 2.0) + 0.5;
        assert_eq!(expression(&vars, &e).to_string(), "-2 * a + 0.5");

        let e = Expression::constant(3.0);
        assert_eq!(expression(&vars, &e).to_string(), "3");
    }

    #[test]
    fn test_constraint_display() {
        let mut vars = Variables::new();
        let w = vars.new_variable("", 0.0);

        let c = Constraint::inequality(w - 20.0, Relation::GreaterOrEqual);
        assert_eq!(constraint(&vars, &c).to_string(), "v0 - 20 >= 0");

        let c = c.with_strength(Strength::Weak).with_weight(2.0);
        assert_eq!(constraint(&vars, &c).to_string(), "v0 - 20 >= 0 | weak x2");
    }
}
