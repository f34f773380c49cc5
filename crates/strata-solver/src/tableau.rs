//! The simplex tableau.
//!
//! Each row expresses one basic symbol in terms of parametric (non-basic)
//! symbols. Restricted basic symbols must stay non-negative; the objective
//! row is kept optimal tier by tier.

use std::cmp::Ordering;

use indexmap::IndexMap;
use strata_core::SolverError;

use crate::row::Row;
use crate::symbol::{Symbol, SymbolKind, SymbolTable};
use crate::weight::{Objective, SymbolicWeight};

/// Which objective an optimisation pass minimises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Main,
    Artificial,
}

#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    rows: IndexMap<Symbol, Row>,
    objective: Objective,
    /// Phase-one objective, present only while adding a row through an
    /// artificial variable
    artificial: Option<Objective>,
    /// Restricted rows that may have gone negative; drained by `dual_optimize`
    infeasible_rows: Vec<Symbol>,
    epsilon: f64,
    max_pivots: usize,
}

fn invariant(message: impl Into<String>) -> SolverError {
    SolverError::InternalInvariantViolation(message.into())
}

impl Tableau {
    pub(crate) fn new(epsilon: f64, max_pivots: usize) -> Self {
        Self {
            rows: IndexMap::new(),
            objective: Objective::new(),
            artificial: None,
            infeasible_rows: Vec::new(),
            epsilon,
            max_pivots,
        }
    }

    pub(crate) fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub(crate) fn is_basic(&self, symbol: Symbol) -> bool {
        self.rows.contains_key(&symbol)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (Symbol, &Row)> + '_ {
        self.rows.iter().map(|(&s, r)| (s, r))
    }

    pub(crate) fn objective(&self) -> &Objective {
        &self.objective
    }

    pub(crate) fn has_artificial(&self) -> bool {
        self.artificial.is_some()
    }

    /// Current value of a symbol: its row constant when basic, zero otherwise.
    pub(crate) fn value_of(&self, symbol: Symbol) -> f64 {
        self.rows.get(&symbol).map_or(0.0, |row| row.constant)
    }

    /// Add `coefficient * symbol` to `row`, replacing a basic symbol by its row.
    pub(crate) fn expand_into(&self, row: &mut Row, symbol: Symbol, coefficient: f64) {
        match self.rows.get(&symbol) {
            Some(basic) => row.insert_row(basic, coefficient, self.epsilon),
            None => row.insert_symbol(symbol, coefficient, self.epsilon),
        }
    }

    /// Add a row for `basic`, which must not already be basic.
    pub(crate) fn insert_row(&mut self, basic: Symbol, row: Row) -> Result<(), SolverError> {
        if self.rows.contains_key(&basic) {
            return Err(invariant(format!("symbol {} is already basic", basic.id())));
        }
        self.rows.insert(basic, row);
        Ok(())
    }

    pub(crate) fn remove_row(&mut self, basic: Symbol) -> Option<Row> {
        self.rows.swap_remove(&basic)
    }

    /// Replace `symbol` by `row` in every row and in the objectives.
    pub(crate) fn substitute_out(&mut self, symbol: Symbol, row: &Row) {
        let epsilon = self.epsilon;
        for (&basic, other) in self.rows.iter_mut() {
            if other.substitute(symbol, row, epsilon)
                && basic.is_restricted()
                && other.constant < -epsilon
            {
                self.infeasible_rows.push(basic);
            }
        }
        self.objective.substitute(symbol, row, epsilon);
        if let Some(artificial) = &mut self.artificial {
            artificial.substitute(symbol, row, epsilon);
        }
    }

    /// Exchange the parametric `entering` symbol with the basic `leaving` one.
    pub(crate) fn pivot(&mut self, entering: Symbol, leaving: Symbol) -> Result<(), SolverError> {
        let mut row = self
            .rows
            .swap_remove(&leaving)
            .ok_or_else(|| invariant(format!("pivot on non-basic symbol {}", leaving.id())))?;
        if !row.contains(entering) {
            return Err(invariant(format!(
                "row {} does not reference entering symbol {}",
                leaving.id(),
                entering.id()
            )));
        }
        log::trace!("pivot: {} enters, {} leaves", entering.id(), leaving.id());
        row.solve_for_symbols(leaving, entering, self.epsilon);
        self.substitute_out(entering, &row);
        self.rows.insert(entering, row);
        Ok(())
    }

    /// Minimise the main objective with primal simplex pivots.
    pub(crate) fn optimize(&mut self) -> Result<usize, SolverError> {
        self.optimize_target(Target::Main)
    }

    fn optimize_target(&mut self, target: Target) -> Result<usize, SolverError> {
        let mut pivots = 0;
        loop {
            let objective = match target {
                Target::Main => &self.objective,
                Target::Artificial => match &self.artificial {
                    Some(artificial) => artificial,
                    None => return Ok(pivots),
                },
            };
            let Some(entering) = objective.entering_symbol(self.epsilon) else {
                return Ok(pivots);
            };
            let leaving = self
                .leaving_row(entering)
                .ok_or_else(|| invariant("the objective is unbounded"))?;
            if pivots >= self.max_pivots {
                return Err(SolverError::NonConvergence { pivots });
            }
            self.pivot(entering, leaving)?;
            pivots += 1;
        }
    }

    /// Ratio test: among restricted rows with a negative coefficient on
    /// `entering`, the smallest `constant / |coefficient|`, lowest id on ties.
    fn leaving_row(&self, entering: Symbol) -> Option<Symbol> {
        let mut best: Option<(f64, Symbol)> = None;
        for (&basic, row) in &self.rows {
            if basic.is_external() {
                continue;
            }
            let coeff = row.coefficient(entering);
            if coeff >= 0.0 {
                continue;
            }
            let ratio = -row.constant / coeff;
            let better = match best {
                None => true,
                Some((best_ratio, best_symbol)) => {
                    ratio < best_ratio - self.epsilon
                        || ((ratio - best_ratio).abs() <= self.epsilon && basic < best_symbol)
                }
            };
            if better {
                best = Some((ratio, basic));
            }
        }
        best.map(|(_, symbol)| symbol)
    }

    /// Restore feasibility after row constants changed, keeping the
    /// objective optimal. Only rows reached from the infeasible ones are
    /// touched.
    pub(crate) fn dual_optimize(&mut self) -> Result<usize, SolverError> {
        let mut pivots = 0;
        while let Some(leaving) = self.infeasible_rows.pop() {
            let infeasible = self
                .rows
                .get(&leaving)
                .is_some_and(|row| row.constant < -self.epsilon);
            if !infeasible {
                continue;
            }
            let entering = self.dual_entering_symbol(leaving).ok_or_else(|| {
                invariant(format!("no dual entering symbol for row {}", leaving.id()))
            })?;
            if pivots >= self.max_pivots {
                return Err(SolverError::NonConvergence { pivots });
            }
            self.pivot(entering, leaving)?;
            pivots += 1;
        }
        Ok(pivots)
    }

    /// The positive-coefficient symbol in an infeasible row with the smallest
    /// objective ratio, lowest id on ties.
    fn dual_entering_symbol(&self, leaving: Symbol) -> Option<Symbol> {
        let row = self.rows.get(&leaving)?;
        let mut best: Option<(SymbolicWeight, Symbol)> = None;
        for (symbol, coeff) in row.cells() {
            if coeff <= 0.0 || symbol.is_dummy() {
                continue;
            }
            let ratio = self.objective.coefficient(symbol).scaled(1.0 / coeff);
            let better = match &best {
                None => true,
                Some((best_ratio, best_symbol)) => match ratio.compare(best_ratio, self.epsilon) {
                    Ordering::Less => true,
                    Ordering::Equal => symbol < *best_symbol,
                    Ordering::Greater => false,
                },
            };
            if better {
                best = Some((ratio, symbol));
            }
        }
        best.map(|(_, symbol)| symbol)
    }

    /// Row to pivot on when removing a parametric marker.
    ///
    /// Preference order: restricted rows with a negative coefficient (smallest
    /// ratio), restricted rows with a positive coefficient (smallest ratio),
    /// then external rows. Ties go to the lowest id.
    fn marker_leaving_row(&self, marker: Symbol) -> Option<Symbol> {
        let mut first: Option<(f64, Symbol)> = None;
        let mut second: Option<(f64, Symbol)> = None;
        let mut third: Option<Symbol> = None;

        let closer = |candidate: (f64, Symbol), current: Option<(f64, Symbol)>| match current {
            None => true,
            Some((ratio, symbol)) => {
                candidate.0 < ratio - self.epsilon
                    || ((candidate.0 - ratio).abs() <= self.epsilon && candidate.1 < symbol)
            }
        };

        for (&basic, row) in &self.rows {
            let coeff = row.coefficient(marker);
            if coeff == 0.0 {
                continue;
            }
            if basic.is_external() {
                if third.map_or(true, |s| basic < s) {
                    third = Some(basic);
                }
            } else if coeff < 0.0 {
                let candidate = (-row.constant / coeff, basic);
                if closer(candidate, first) {
                    first = Some(candidate);
                }
            } else {
                let candidate = (row.constant / coeff, basic);
                if closer(candidate, second) {
                    second = Some(candidate);
                }
            }
        }

        first.or(second).map(|(_, s)| s).or(third)
    }

    /// Remove a marker symbol from the tableau entirely, dropping the row
    /// that belonged to its constraint.
    pub(crate) fn eliminate_marker(&mut self, marker: Symbol) -> Result<(), SolverError> {
        if self.rows.swap_remove(&marker).is_some() {
            return Ok(());
        }
        let leaving = self
            .marker_leaving_row(marker)
            .ok_or_else(|| invariant(format!("marker {} is not in the tableau", marker.id())))?;
        let mut row = self
            .rows
            .swap_remove(&leaving)
            .ok_or_else(|| invariant(format!("leaving row {} vanished", leaving.id())))?;
        row.solve_for_symbols(leaving, marker, self.epsilon);
        self.substitute_out(marker, &row);
        Ok(())
    }

    /// Add a row with no usable subject by minimising an artificial
    /// variable. Returns false when the row cannot be satisfied.
    pub(crate) fn add_with_artificial(
        &mut self,
        row: &Row,
        symbols: &mut SymbolTable,
    ) -> Result<bool, SolverError> {
        let art = symbols.next(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(Objective::from_row(row));

        let result = self.optimize_target(Target::Artificial);
        let success = self
            .artificial
            .take()
            .is_some_and(|artificial| artificial.constant().is_zero(self.epsilon));
        result?;

        if let Some(mut art_row) = self.rows.swap_remove(&art) {
            if art_row.is_constant() {
                return Ok(success);
            }
            let Some(entering) = art_row.any_pivotable_symbol() else {
                return Ok(false);
            };
            art_row.solve_for_symbols(art, entering, self.epsilon);
            self.substitute_out(entering, &art_row);
            self.rows.insert(entering, art_row);
        }

        for other in self.rows.values_mut() {
            other.remove(art);
        }
        self.objective.remove(art);
        Ok(success)
    }

    /// Penalise `error` with `weight` in the objective.
    pub(crate) fn add_error_term(&mut self, error: Symbol, weight: SymbolicWeight) {
        self.objective.insert_symbol(error, weight, self.epsilon);
    }

    /// Undo `add_error_term`, accounting for `error` having become basic.
    pub(crate) fn remove_error_term(&mut self, error: Symbol, weight: SymbolicWeight) {
        let negated = weight.scaled(-1.0);
        match self.rows.get(&error) {
            Some(row) => self.objective.insert_row(row, negated, self.epsilon),
            None => self.objective.insert_symbol(error, negated, self.epsilon),
        }
    }

    /// Shift an edit constraint's target by `delta`.
    ///
    /// `plus` and `minus` are the edit's error symbols. Rows whose constant
    /// goes negative are queued for `dual_optimize`.
    pub(crate) fn apply_edit_delta(&mut self, plus: Symbol, minus: Symbol, delta: f64) {
        let epsilon = self.epsilon;
        if let Some(row) = self.rows.get_mut(&plus) {
            if row.add_constant(-delta) < -epsilon {
                self.infeasible_rows.push(plus);
            }
            return;
        }
        if let Some(row) = self.rows.get_mut(&minus) {
            if row.add_constant(delta) < -epsilon {
                self.infeasible_rows.push(minus);
            }
            return;
        }
        for (&basic, row) in self.rows.iter_mut() {
            let coeff = row.coefficient(plus);
            if coeff == 0.0 {
                continue;
            }
            if row.add_constant(delta * coeff) < -epsilon && basic.is_restricted() {
                self.infeasible_rows.push(basic);
            }
        }
    }

    /// Zero the constant of a basic error symbol, re-anchoring its
    /// constraint at the current solution.
    pub(crate) fn reset_error_constant(&mut self, error: Symbol) {
        if let Some(row) = self.rows.get_mut(&error) {
            row.constant = 0.0;
        }
    }
}
