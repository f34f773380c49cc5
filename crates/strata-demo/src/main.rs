//! Lays out two boxes inside a panel and prints the solved positions.
//!
//! Run with `RUST_LOG=debug` to see the solver's progress.

use strata_core::format;
use strata_solver::{Constraint, Expression, Relation, Solver, StrataError, Variable, Variables};

/// Horizontal extent of a layout element.
#[derive(Debug, Clone, Copy)]
struct Span {
    left: Variable,
    right: Variable,
    width: Variable,
}

impl Span {
    fn new(vars: &mut Variables, name: &str, left: f64, right: f64, width: f64) -> Self {
        Self {
            left: vars.new_variable(format!("{name}.left"), left),
            right: vars.new_variable(format!("{name}.right"), right),
            width: vars.new_variable(format!("{name}.width"), width),
        }
    }

    fn variables(&self) -> [Variable; 3] {
        [self.left, self.right, self.width]
    }
}

/// `low <= expr <= high` as a pair of required inequalities.
fn clamp(expr: Expression, low: f64, high: f64) -> [Constraint; 2] {
    [
        Constraint::inequality(expr.clone() - low, Relation::GreaterOrEqual),
        Constraint::inequality(expr - high, Relation::LessOrEqual),
    ]
}

fn main() -> Result<(), StrataError> {
    env_logger::init();

    let ten = 10.0;
    let twenty = 20.0;
    let thirty = 30.0;

    let mut vars = Variables::new();
    let panel = Span::new(&mut vars, "p", 0.0, 80.0, 80.0);
    let a = Span::new(&mut vars, "a", 10.0, 30.0, 20.0);
    let b = Span::new(&mut vars, "b", 40.0, 70.0, 30.0);

    let constraints: Vec<Constraint> = [
        clamp(a.left - panel.left, ten, ten),
        clamp(b.left - a.right, ten, ten),
        clamp(panel.right - b.right, ten, ten),
        clamp(Expression::from_variable(a.width), twenty, twenty),
        clamp(Expression::from_variable(b.width), thirty, thirty),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut solver = Solver::new();
    solver.add_constraints(&constraints)?;
    solver.solve(&mut vars)?;
    log::info!("solved {} constraints", constraints.len());

    for span in [panel, a, b] {
        for var in span.variables() {
            println!("{}", format::variable(&vars, var));
        }
    }
    for constraint in &constraints {
        println!("{}", format::constraint(&vars, constraint));
    }

    Ok(())
}
