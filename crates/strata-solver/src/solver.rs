//! The incremental constraint solver.
//!
//! The solver translates constraints into tableau rows, keeps the tableau
//! feasible and optimal as constraints come and go, and publishes solved
//! values back into the caller's [`Variables`] arena.

use indexmap::IndexMap;
use strata_core::{Constraint, Expression, Relation, SolverError, Strength, Variable, Variables};

use crate::config::SolverConfig;
use crate::row::Row;
use crate::symbol::{Symbol, SymbolKind, SymbolTable};
use crate::tableau::Tableau;
use crate::weight::{SymbolicWeight, Tier};

/// Symbols created for one constraint. The marker identifies the
/// constraint's row; `other` is the second error or slack symbol, if any.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tag {
    pub(crate) marker: Symbol,
    pub(crate) other: Option<Symbol>,
    /// Objective weight; `None` for required constraints
    pub(crate) weight: Option<SymbolicWeight>,
}

impl Tag {
    fn error_symbols(&self) -> impl Iterator<Item = Symbol> {
        [Some(self.marker), self.other]
            .into_iter()
            .flatten()
            .filter(|s| s.is_error())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct VarEntry {
    pub(crate) symbol: Symbol,
    /// Number of active constraints, stays and edits referencing the variable
    refs: usize,
}

#[derive(Debug, Clone, Copy)]
struct EditInfo {
    tag: Tag,
    /// Current target value
    constant: f64,
}

/// The Cassowary constraint solver.
#[derive(Debug, Clone)]
pub struct Solver {
    pub(crate) config: SolverConfig,
    pub(crate) tableau: Tableau,
    symbols: SymbolTable,
    pub(crate) vars: IndexMap<Variable, VarEntry>,
    pub(crate) constraints: IndexMap<Constraint, Tag>,
    stays: IndexMap<Variable, Tag>,
    edits: IndexMap<Variable, EditInfo>,
    /// Variables of each `begin_edit` call, innermost last
    edit_sessions: Vec<Vec<Variable>>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            tableau: Tableau::new(config.epsilon, config.max_pivots),
            config,
            symbols: SymbolTable::default(),
            vars: IndexMap::new(),
            constraints: IndexMap::new(),
            stays: IndexMap::new(),
            edits: IndexMap::new(),
            edit_sessions: Vec::new(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Add a constraint to the solver.
    ///
    /// Fails with [`SolverError::RequiredFailure`] when a required constraint
    /// conflicts with the required constraints already present; the solver is
    /// left exactly as it was before the call.
    pub fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        self.transaction(|solver| solver.insert_tracked(constraint))
    }

    /// Add several constraints as one unit: if any of them fails, none is
    /// added.
    pub fn add_constraints<'a>(
        &mut self,
        constraints: impl IntoIterator<Item = &'a Constraint>,
    ) -> Result<(), SolverError> {
        self.transaction(|solver| {
            constraints
                .into_iter()
                .try_for_each(|constraint| solver.insert_tracked(constraint))
        })
    }

    /// Validate, insert and record one constraint, without a snapshot.
    fn insert_tracked(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        if self.constraints.contains_key(constraint) {
            return Err(SolverError::DuplicateConstraint);
        }
        check_finite(constraint.expression())?;
        let weight = self.priority(constraint.strength(), constraint.weight())?;

        let tag = self
            .insert_constraint(constraint.expression(), constraint.relation(), weight)
            .map_err(|err| {
                if err == SolverError::RequiredFailure {
                    log::warn!("rejected unsatisfiable required constraint");
                }
                err
            })?;
        self.constraints.insert(constraint.clone(), tag);

        log::debug!(
            "added {} {} constraint ({} rows)",
            constraint.strength(),
            constraint.relation(),
            self.tableau.rows().count()
        );
        Ok(())
    }

    /// Remove a previously added constraint.
    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let tag = *self
            .constraints
            .get(constraint)
            .ok_or(SolverError::UnknownConstraint)?;

        self.transaction(|solver| {
            solver.constraints.shift_remove(constraint);
            solver.remove_tagged(&tag)?;
            solver.release_expression(constraint.expression());
            Ok(())
        })?;

        log::debug!(
            "removed {} {} constraint",
            constraint.strength(),
            constraint.relation()
        );
        Ok(())
    }

    /// Test whether a constraint is active in the solver.
    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(constraint)
    }

    /// Iterate over the active constraints in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.keys()
    }

    /// Add a stay: a non-required preference for `var` to remain at `value`.
    pub fn add_stay(
        &mut self,
        var: Variable,
        value: f64,
        strength: Strength,
    ) -> Result<(), SolverError> {
        self.transaction(|solver| solver.insert_stay(var, value, strength))
    }

    fn insert_stay(
        &mut self,
        var: Variable,
        value: f64,
        strength: Strength,
    ) -> Result<(), SolverError> {
        if self.stays.contains_key(&var) {
            return Err(SolverError::DuplicateConstraint);
        }
        if !value.is_finite() {
            return Err(SolverError::NonFiniteValue(value));
        }
        let weight = self.priority(strength, 1.0)?;
        let expr = Expression::from_variable(var) - value;
        let tag = self.insert_constraint(&expr, Relation::Equal, weight)?;
        self.stays.insert(var, tag);
        Ok(())
    }

    /// Remove the stay on `var`.
    pub fn remove_stay(&mut self, var: Variable) -> Result<(), SolverError> {
        let tag = *self.stays.get(&var).ok_or(SolverError::UnknownConstraint)?;
        self.transaction(|solver| {
            solver.stays.shift_remove(&var);
            solver.remove_tagged(&tag)?;
            solver.release_variable(var);
            Ok(())
        })
    }

    pub fn has_stay(&self, var: Variable) -> bool {
        self.stays.contains_key(&var)
    }

    /// Start an edit session for `edited`.
    ///
    /// Each variable is pinned to its current value by an equality that is
    /// stronger than any non-required constraint. With implicit stays, the
    /// variables are first anchored at their values in `vars` exactly as
    /// [`Solver::solve`] would, so the pins start from the solved layout even
    /// before the first solve. Without them, a variable the solver has not
    /// seen starts from its value in `vars`.
    ///
    /// Sessions nest; `end_edit` closes the most recent one.
    pub fn begin_edit(&mut self, vars: &Variables, edited: &[Variable]) -> Result<(), SolverError> {
        for (i, &var) in edited.iter().enumerate() {
            if self.edits.contains_key(&var) || edited[..i].contains(&var) {
                return Err(SolverError::DuplicateEditVariable(var));
            }
        }

        self.transaction(|solver| {
            if solver.config.implicit_stays {
                solver.anchor_unanchored(vars, edited)?;
            }
            let weight = Some(SymbolicWeight::of(Tier::Edit, 1.0));
            for &var in edited {
                let value = match vars.get(var) {
                    Some(value) if !solver.vars.contains_key(&var) => value,
                    _ => solver.value(var),
                };
                let expr = Expression::from_variable(var) - value;
                let tag = solver.insert_constraint(&expr, Relation::Equal, weight)?;
                solver.edits.insert(
                    var,
                    EditInfo {
                        tag,
                        constant: value,
                    },
                );
            }
            solver.edit_sessions.push(edited.to_vec());
            Ok(())
        })?;

        log::debug!(
            "edit session {} started for {} variables",
            self.edit_sessions.len(),
            edited.len()
        );
        Ok(())
    }

    /// Move the target of an edit variable and re-optimise incrementally.
    ///
    /// Only rows reachable from the edit's error symbols are revisited. A
    /// non-finite target is rejected before anything changes; a fatal error
    /// from this call leaves the solver unusable.
    pub fn suggest_value(&mut self, var: Variable, value: f64) -> Result<(), SolverError> {
        if !value.is_finite() {
            return Err(SolverError::NonFiniteValue(value));
        }
        let info = self
            .edits
            .get_mut(&var)
            .ok_or(SolverError::UnknownEditVariable(var))?;
        let delta = value - info.constant;
        info.constant = value;
        let tag = info.tag;

        let minus = tag.other.ok_or_else(|| {
            SolverError::InternalInvariantViolation(format!("edit on {} has one error symbol", var))
        })?;
        self.tableau.apply_edit_delta(tag.marker, minus, delta);
        let pivots = self.tableau.dual_optimize()?;
        log::trace!("suggested {} = {} ({} dual pivots)", var, value, pivots);
        self.verify()
    }

    /// Close the most recent edit session.
    ///
    /// Stays are re-anchored at the current solution first, so edited
    /// variables keep the values they were moved to.
    pub fn end_edit(&mut self) -> Result<(), SolverError> {
        let session = self
            .edit_sessions
            .last()
            .cloned()
            .ok_or(SolverError::NoActiveEdit)?;

        self.transaction(|solver| {
            solver.reset_stay_constants();
            for &var in session.iter().rev() {
                let info = solver
                    .edits
                    .shift_remove(&var)
                    .ok_or(SolverError::UnknownEditVariable(var))?;
                solver.remove_tagged(&info.tag)?;
                solver.release_variable(var);
            }
            solver.edit_sessions.pop();
            Ok(())
        })?;

        log::debug!("edit session closed, {} remaining", self.edit_sessions.len());
        Ok(())
    }

    pub fn has_edit_variable(&self, var: Variable) -> bool {
        self.edits.contains_key(&var)
    }

    /// Run a full optimisation pass and copy solved values into `vars`.
    ///
    /// With implicit stays enabled, every variable the solver knows that has
    /// no stay yet first receives one at its current value in `vars`.
    pub fn solve(&mut self, vars: &mut Variables) -> Result<(), SolverError> {
        if self.config.implicit_stays {
            self.transaction(|solver| solver.anchor_unanchored(vars, &[]))?;
        }

        let pivots = self.tableau.optimize()?;
        self.verify()?;

        for (&var, entry) in &self.vars {
            vars.set_value(var, self.tableau.value_of(entry.symbol));
        }
        log::debug!("solved {} variables ({} pivots)", self.vars.len(), pivots);
        Ok(())
    }

    /// Current solved value of a variable; zero for variables the solver
    /// has not seen.
    pub fn value(&self, var: Variable) -> f64 {
        self.vars
            .get(&var)
            .map_or(0.0, |entry| self.tableau.value_of(entry.symbol))
    }

    /// Reset the solver to the empty starting condition.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    /// Add a stay at the arena value for every known variable, and every
    /// variable in `extra`, that has none yet.
    fn anchor_unanchored(
        &mut self,
        vars: &Variables,
        extra: &[Variable],
    ) -> Result<(), SolverError> {
        let unanchored: Vec<Variable> = self
            .vars
            .keys()
            .chain(extra)
            .copied()
            .filter(|var| !self.stays.contains_key(var))
            .collect();
        let strength = self.config.stay_strength;
        for var in unanchored {
            if self.stays.contains_key(&var) {
                continue;
            }
            if let Some(value) = vars.get(var) {
                self.insert_stay(var, value, strength)?;
            }
        }
        Ok(())
    }

    /// Objective weight for a strength; `None` for required.
    ///
    /// Weights must be finite and above epsilon.
    fn priority(
        &self,
        strength: Strength,
        weight: f64,
    ) -> Result<Option<SymbolicWeight>, SolverError> {
        if !weight.is_finite() || weight <= self.config.epsilon {
            return Err(SolverError::InvalidWeight(weight));
        }
        Ok(Tier::from_strength(strength).map(|tier| SymbolicWeight::of(tier, weight)))
    }

    /// Run `op`, restoring the previous state if it or the invariant check
    /// fails.
    fn transaction<T>(
        &mut self,
        op: impl FnOnce(&mut Solver) -> Result<T, SolverError>,
    ) -> Result<T, SolverError> {
        let snapshot = self.clone();
        let result = op(self).and_then(|value| self.verify().map(|()| value));
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    fn verify(&self) -> Result<(), SolverError> {
        if self.config.verify_invariants {
            self.check_invariants()
        } else {
            Ok(())
        }
    }

    /// Translate `expr OP 0` into a tableau row and make it basic.
    fn insert_constraint(
        &mut self,
        expr: &Expression,
        relation: Relation,
        weight: Option<SymbolicWeight>,
    ) -> Result<Tag, SolverError> {
        let (mut row, tag) = self.create_row(expr, relation, weight);
        let mut subject = choose_subject(&row, &tag);

        // A row made only of dummies is either redundant or a contradiction
        // between required equalities.
        if subject.is_none() && row.all_dummies() {
            if row.constant.abs() >= self.config.epsilon {
                return Err(SolverError::RequiredFailure);
            }
            subject = Some(tag.marker);
        }

        match subject {
            Some(subject) => {
                row.solve_for(subject);
                self.tableau.substitute_out(subject, &row);
                self.tableau.insert_row(subject, row)?;
            }
            None => {
                if !self.tableau.add_with_artificial(&row, &mut self.symbols)? {
                    return Err(SolverError::RequiredFailure);
                }
            }
        }

        self.tableau.optimize()?;
        Ok(tag)
    }

    /// Build the row for `expr OP 0` in terms of the current parametric
    /// symbols, adding slack, error and dummy symbols.
    fn create_row(
        &mut self,
        expr: &Expression,
        relation: Relation,
        weight: Option<SymbolicWeight>,
    ) -> (Row, Tag) {
        let epsilon = self.config.epsilon;
        let mut row = Row::new(expr.constant_value());
        for (var, coeff) in expr.terms() {
            let symbol = self.acquire_variable(var);
            if coeff.abs() >= epsilon {
                self.tableau.expand_into(&mut row, symbol, coeff);
            }
        }

        let tag = match relation {
            Relation::LessOrEqual | Relation::GreaterOrEqual => {
                let coeff = if relation == Relation::LessOrEqual {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.symbols.next(SymbolKind::Slack);
                row.insert_symbol(slack, coeff, epsilon);
                let other = weight.map(|w| {
                    let error = self.symbols.next(SymbolKind::Error);
                    row.insert_symbol(error, -coeff, epsilon);
                    self.tableau.add_error_term(error, w);
                    error
                });
                Tag {
                    marker: slack,
                    other,
                    weight,
                }
            }
            Relation::Equal => match weight {
                Some(w) => {
                    let plus = self.symbols.next(SymbolKind::Error);
                    let minus = self.symbols.next(SymbolKind::Error);
                    row.insert_symbol(plus, -1.0, epsilon);
                    row.insert_symbol(minus, 1.0, epsilon);
                    self.tableau.add_error_term(plus, w);
                    self.tableau.add_error_term(minus, w);
                    Tag {
                        marker: plus,
                        other: Some(minus),
                        weight,
                    }
                }
                None => {
                    let dummy = self.symbols.next(SymbolKind::Dummy);
                    row.insert_symbol(dummy, 1.0, epsilon);
                    Tag {
                        marker: dummy,
                        other: None,
                        weight,
                    }
                }
            },
        };

        if row.constant < 0.0 {
            row.reverse_sign();
        }
        (row, tag)
    }

    /// Take a constraint's symbols out of the objective and the tableau.
    fn remove_tagged(&mut self, tag: &Tag) -> Result<(), SolverError> {
        // Objective effects must go before the marker is pivoted out.
        if let Some(weight) = tag.weight {
            for error in tag.error_symbols() {
                self.tableau.remove_error_term(error, weight);
            }
        }
        self.tableau.eliminate_marker(tag.marker)?;
        self.tableau.optimize()?;
        Ok(())
    }

    fn reset_stay_constants(&mut self) {
        for tag in self.stays.values() {
            for error in tag.error_symbols() {
                self.tableau.reset_error_constant(error);
            }
        }
    }

    /// Symbol for `var`, created on first use; bumps its reference count.
    fn acquire_variable(&mut self, var: Variable) -> Symbol {
        let symbols = &mut self.symbols;
        let entry = self.vars.entry(var).or_insert_with(|| VarEntry {
            symbol: symbols.next(SymbolKind::External),
            refs: 0,
        });
        entry.refs += 1;
        entry.symbol
    }

    fn release_expression(&mut self, expr: &Expression) {
        for var in expr.variables() {
            self.release_variable(var);
        }
    }

    /// Drop one reference to `var`, forgetting it when none remain.
    fn release_variable(&mut self, var: Variable) {
        let Some(entry) = self.vars.get_mut(&var) else {
            return;
        };
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            let symbol = entry.symbol;
            self.vars.shift_remove(&var);
            self.tableau.remove_row(symbol);
        }
    }
}

fn check_finite(expr: &Expression) -> Result<(), SolverError> {
    let constant = expr.constant_value();
    if !constant.is_finite() {
        return Err(SolverError::NonFiniteValue(constant));
    }
    match expr.terms().find(|(_, coeff)| !coeff.is_finite()) {
        Some((_, coeff)) => Err(SolverError::NonFiniteValue(coeff)),
        None => Ok(()),
    }
}

/// Pick the symbol a new row will be solved for.
///
/// Externals come first (lowest id). Otherwise a slack or error marker with
/// a negative coefficient, which keeps the solved row feasible.
fn choose_subject(row: &Row, tag: &Tag) -> Option<Symbol> {
    if let Some(external) = row.cells().map(|(s, _)| s).filter(|s| s.is_external()).min() {
        return Some(external);
    }
    [Some(tag.marker), tag.other]
        .into_iter()
        .flatten()
        .find(|&s| s.is_pivotable() && row.coefficient(s) < 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_simple_equality() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(x - 100.0)).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 100.0));
    }

    #[test]
    fn test_two_variables() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let y = vars.new_variable("y", 0.0);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(x - 100.0)).unwrap();
        solver.add_constraint(&Constraint::equation(y - x - 50.0)).unwrap();
        solver.solve(&mut vars).unwrap();

        assert!(close(vars[x], 100.0));
        assert!(close(vars[y], 150.0));
    }

    #[test]
    fn test_inequality_with_weak_preference() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::inequality(x - 50.0, Relation::GreaterOrEqual))
            .unwrap();
        solver
            .add_constraint(&Constraint::new(x - 10.0, Relation::Equal, Strength::Weak))
            .unwrap();
        solver.solve(&mut vars).unwrap();

        assert!(close(vars[x], 50.0));
    }

    #[test]
    fn test_strength_ordering() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::new(x - 100.0, Relation::Equal, Strength::Weak))
            .unwrap();
        solver
            .add_constraint(&Constraint::new(x - 50.0, Relation::Equal, Strength::Strong))
            .unwrap();
        solver
            .add_constraint(&Constraint::new(x - 75.0, Relation::Equal, Strength::Medium))
            .unwrap();
        solver.solve(&mut vars).unwrap();

        assert!(close(vars[x], 50.0));
    }

    #[test]
    fn test_weights_within_a_tier() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::new(x - 10.0, Relation::Equal, Strength::Medium))
            .unwrap();
        solver
            .add_constraint(
                &Constraint::new(x - 20.0, Relation::Equal, Strength::Medium).with_weight(3.0),
            )
            .unwrap();
        solver.solve(&mut vars).unwrap();

        assert!(close(vars[x], 20.0));
    }

    #[test]
    fn test_duplicate_and_unknown_constraints() {
        let x = Variable::new(0);
        let mut solver = Solver::new();
        let c = Constraint::equation(x - 1.0);

        solver.add_constraint(&c).unwrap();
        assert_eq!(solver.add_constraint(&c), Err(SolverError::DuplicateConstraint));

        solver.remove_constraint(&c).unwrap();
        assert!(!solver.has_constraint(&c));
        assert_eq!(solver.remove_constraint(&c), Err(SolverError::UnknownConstraint));
    }

    #[test]
    fn test_invalid_weight() {
        let x = Variable::new(0);
        let mut solver = Solver::new();
        let c = Constraint::new(x - 1.0, Relation::Equal, Strength::Weak).with_weight(0.0);
        assert_eq!(solver.add_constraint(&c), Err(SolverError::InvalidWeight(0.0)));
        assert!(!solver.has_constraint(&c));
    }

    #[test]
    fn test_required_failure_rolls_back() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(x - 5.0)).unwrap();
        let conflicting = Constraint::equation(x - 6.0);
        assert_eq!(
            solver.add_constraint(&conflicting),
            Err(SolverError::RequiredFailure)
        );
        assert!(!solver.has_constraint(&conflicting));

        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 5.0));
    }

    #[test]
    fn test_required_inequality_conflict() {
        let x = Variable::new(0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::inequality(x - 10.0, Relation::GreaterOrEqual))
            .unwrap();
        let rows_before = solver.tableau.rows().count();

        let result =
            solver.add_constraint(&Constraint::inequality(x - 5.0, Relation::LessOrEqual));
        assert_eq!(result, Err(SolverError::RequiredFailure));
        assert_eq!(solver.tableau.rows().count(), rows_before);
        assert!(close(solver.value(x), 10.0));
    }

    #[test]
    fn test_redundant_required_equality() {
        let x = Variable::new(0);
        let y = Variable::new(1);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(x - 5.0)).unwrap();
        solver.add_constraint(&Constraint::equation(y - x)).unwrap();
        // Implied by the two above.
        let redundant = Constraint::equation(y - 5.0);
        solver.add_constraint(&redundant).unwrap();
        assert!(close(solver.value(y), 5.0));

        solver.remove_constraint(&redundant).unwrap();
        assert!(close(solver.value(y), 5.0));
    }

    #[test]
    fn test_edit_session() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 10.0);
        let y = vars.new_variable("y", 20.0);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(y - x * 2.0)).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[y], 20.0));

        solver.begin_edit(&vars, &[x]).unwrap();
        assert!(solver.has_edit_variable(x));
        solver.suggest_value(x, 30.0).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 30.0));
        assert!(close(vars[y], 60.0));

        solver.end_edit().unwrap();
        assert!(!solver.has_edit_variable(x));
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 30.0));
        assert!(close(vars[y], 60.0));
    }

    #[test]
    fn test_edit_cannot_break_required() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::inequality(x - 100.0, Relation::LessOrEqual))
            .unwrap();
        solver.begin_edit(&vars, &[x]).unwrap();
        solver.suggest_value(x, 250.0).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 100.0));

        solver.suggest_value(x, 40.0).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 40.0));
        solver.end_edit().unwrap();
    }

    #[test]
    fn test_edit_overrides_strong() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::new(x - 5.0, Relation::Equal, Strength::Strong))
            .unwrap();
        solver.begin_edit(&vars, &[x]).unwrap();
        solver.suggest_value(x, 8.0).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 8.0));
    }

    #[test]
    fn test_edit_errors() {
        let vars = Variables::new();
        let x = Variable::new(0);
        let mut solver = Solver::new();

        assert_eq!(solver.end_edit(), Err(SolverError::NoActiveEdit));
        assert_eq!(
            solver.suggest_value(x, 1.0),
            Err(SolverError::UnknownEditVariable(x))
        );
        assert_eq!(
            solver.begin_edit(&vars, &[x, x]),
            Err(SolverError::DuplicateEditVariable(x))
        );

        solver.begin_edit(&vars, &[x]).unwrap();
        assert_eq!(
            solver.begin_edit(&vars, &[x]),
            Err(SolverError::DuplicateEditVariable(x))
        );
    }

    #[test]
    fn test_nested_edit_sessions() {
        let vars = Variables::new();
        let x = Variable::new(0);
        let y = Variable::new(1);
        let mut solver = Solver::new();

        solver.begin_edit(&vars, &[x]).unwrap();
        solver.begin_edit(&vars, &[y]).unwrap();
        solver.end_edit().unwrap();
        assert!(solver.has_edit_variable(x));
        assert!(!solver.has_edit_variable(y));
        solver.end_edit().unwrap();
        assert!(!solver.has_edit_variable(x));
    }

    #[test]
    fn test_weight_below_epsilon_is_rejected() {
        let x = Variable::new(0);
        let mut solver = Solver::new();
        let c = Constraint::new(x - 10.0, Relation::Equal, Strength::Weak).with_weight(1e-9);
        assert_eq!(solver.add_constraint(&c), Err(SolverError::InvalidWeight(1e-9)));
        assert!(!solver.has_constraint(&c));
    }

    #[test]
    fn test_small_weights_still_rank() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::with_config(SolverConfig {
            implicit_stays: false,
            ..SolverConfig::default()
        });

        solver
            .add_constraint(
                &Constraint::new(x - 10.0, Relation::Equal, Strength::Weak).with_weight(1e-6),
            )
            .unwrap();
        solver
            .add_constraint(
                &Constraint::new(x - 20.0, Relation::Equal, Strength::Weak).with_weight(2e-6),
            )
            .unwrap();
        solver.solve(&mut vars).unwrap();

        assert!(close(vars[x], 20.0));
    }

    #[test]
    fn test_non_finite_constraints_are_rejected() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 3.0);
        let mut solver = Solver::with_config(SolverConfig {
            verify_invariants: false,
            ..SolverConfig::default()
        });

        let nan = Constraint::equation(x - f64::NAN);
        assert!(matches!(
            solver.add_constraint(&nan),
            Err(SolverError::NonFiniteValue(v)) if v.is_nan()
        ));
        let infinite = Constraint::equation(x * f64::INFINITY);
        assert_eq!(
            solver.add_constraint(&infinite),
            Err(SolverError::NonFiniteValue(f64::INFINITY))
        );
        assert!(!solver.has_constraint(&infinite));
        assert_eq!(
            solver.add_stay(x, f64::NEG_INFINITY, Strength::Weak),
            Err(SolverError::NonFiniteValue(f64::NEG_INFINITY))
        );
        assert!(!solver.has_stay(x));

        solver.add_constraint(&Constraint::equation(x - 7.0)).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 7.0));
    }

    #[test]
    fn test_non_finite_suggestion_leaves_state() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 1.0);
        let y = vars.new_variable("y", 2.0);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(y - x * 2.0)).unwrap();
        solver.solve(&mut vars).unwrap();
        solver.begin_edit(&vars, &[x]).unwrap();
        solver.suggest_value(x, 4.0).unwrap();

        let err = solver.suggest_value(x, f64::NAN).unwrap_err();
        assert!(matches!(err, SolverError::NonFiniteValue(v) if v.is_nan()));
        assert!(!err.is_fatal());
        assert!(close(solver.value(x), 4.0));
        solver.check_invariants().unwrap();

        solver.suggest_value(x, 5.0).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 5.0));
        assert!(close(vars[y], 10.0));
    }

    #[test]
    fn test_edit_before_first_solve_starts_from_arena() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 40.0);
        let y = vars.new_variable("y", 50.0);
        let mut solver = Solver::new();

        solver.add_constraint(&Constraint::equation(y - x - 10.0)).unwrap();
        solver.begin_edit(&vars, &[x]).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 40.0));
        assert!(close(vars[y], 50.0));

        solver.suggest_value(x, 55.0).unwrap();
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 55.0));
        assert!(close(vars[y], 65.0));
    }

    #[test]
    fn test_edit_of_unknown_variable_without_stays() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 12.0);
        let mut solver = Solver::with_config(SolverConfig {
            implicit_stays: false,
            ..SolverConfig::default()
        });

        solver.begin_edit(&vars, &[x]).unwrap();
        assert!(close(solver.value(x), 12.0));
    }

    #[test]
    fn test_add_constraints_is_all_or_nothing() {
        let x = Variable::new(0);
        let mut solver = Solver::new();
        let five = Constraint::equation(x - 5.0);
        let six = Constraint::equation(x - 6.0);

        assert_eq!(
            solver.add_constraints([&five, &six]),
            Err(SolverError::RequiredFailure)
        );
        assert!(!solver.has_constraint(&five));
        assert_eq!(solver.constraints().count(), 0);

        solver.add_constraints([&five]).unwrap();
        assert!(close(solver.value(x), 5.0));
    }

    #[test]
    fn test_stays() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 0.0);
        let mut solver = Solver::with_config(SolverConfig {
            implicit_stays: false,
            ..SolverConfig::default()
        });

        solver.add_stay(x, 42.0, Strength::Weak).unwrap();
        assert!(solver.has_stay(x));
        assert_eq!(
            solver.add_stay(x, 1.0, Strength::Weak),
            Err(SolverError::DuplicateConstraint)
        );
        solver.solve(&mut vars).unwrap();
        assert!(close(vars[x], 42.0));

        solver.remove_stay(x).unwrap();
        assert!(!solver.has_stay(x));
        assert_eq!(solver.remove_stay(x), Err(SolverError::UnknownConstraint));
    }

    #[test]
    fn test_implicit_stays_keep_initial_values() {
        let mut vars = Variables::new();
        let left = vars.new_variable("left", 15.0);
        let right = vars.new_variable("right", 40.0);
        let mut solver = Solver::new();

        solver
            .add_constraint(&Constraint::inequality(right - left, Relation::GreaterOrEqual))
            .unwrap();
        solver.solve(&mut vars).unwrap();

        assert!(close(vars[left], 15.0));
        assert!(close(vars[right], 40.0));
    }

    #[test]
    fn test_removing_last_reference_forgets_variable() {
        let x = Variable::new(0);
        let mut solver = Solver::with_config(SolverConfig {
            implicit_stays: false,
            ..SolverConfig::default()
        });
        let c = Constraint::equation(x - 3.0);

        solver.add_constraint(&c).unwrap();
        assert!(solver.vars.contains_key(&x));
        solver.remove_constraint(&c).unwrap();
        assert!(!solver.vars.contains_key(&x));
        assert_eq!(solver.tableau.rows().count(), 0);
        assert_eq!(solver.value(x), 0.0);
    }

    #[test]
    fn test_reset() {
        let vars = Variables::new();
        let x = Variable::new(0);
        let mut solver = Solver::new();
        let c = Constraint::equation(x - 3.0);
        solver.add_constraint(&c).unwrap();
        solver.begin_edit(&vars, &[x]).unwrap();

        solver.reset();
        assert!(!solver.has_constraint(&c));
        assert!(!solver.has_edit_variable(x));
        assert_eq!(solver.value(x), 0.0);
    }
}
