//! Tableau rows.

use indexmap::IndexMap;

use crate::symbol::Symbol;

/// A row in the simplex tableau: `basic = constant + Σ(coefficient * symbol)`.
///
/// Cells never hold coefficients within `epsilon` of zero.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) constant: f64,
    cells: IndexMap<Symbol, f64>,
}

impl Row {
    pub(crate) fn new(constant: f64) -> Self {
        Self {
            constant,
            cells: IndexMap::new(),
        }
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.cells.iter().map(|(&s, &c)| (s, c))
    }

    pub(crate) fn is_constant(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn coefficient(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    pub(crate) fn contains(&self, symbol: Symbol) -> bool {
        self.cells.contains_key(&symbol)
    }

    /// Add `delta` to the constant and return the new constant.
    pub(crate) fn add_constant(&mut self, delta: f64) -> f64 {
        self.constant += delta;
        self.constant
    }

    /// Add `coefficient * symbol` to the row.
    pub(crate) fn insert_symbol(&mut self, symbol: Symbol, coefficient: f64, epsilon: f64) {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if entry.abs() < epsilon {
            self.cells.swap_remove(&symbol);
        }
    }

    /// Add `coefficient * other` to the row.
    pub(crate) fn insert_row(&mut self, other: &Row, coefficient: f64, epsilon: f64) {
        self.constant += other.constant * coefficient;
        for (&symbol, &c) in &other.cells {
            self.insert_symbol(symbol, c * coefficient, epsilon);
        }
    }

    pub(crate) fn remove(&mut self, symbol: Symbol) -> Option<f64> {
        self.cells.swap_remove(&symbol)
    }

    pub(crate) fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for coeff in self.cells.values_mut() {
            *coeff = -*coeff;
        }
    }

    /// Solve the row for `symbol`, treating the row as `0 = constant + cells`.
    ///
    /// Afterwards the row reads `symbol = constant' + cells'` with `symbol`
    /// removed. The caller guarantees `symbol` is present.
    pub(crate) fn solve_for(&mut self, symbol: Symbol) {
        let coeff = self.cells.swap_remove(&symbol).unwrap_or(1.0);
        let multiplier = -1.0 / coeff;
        self.constant *= multiplier;
        for c in self.cells.values_mut() {
            *c *= multiplier;
        }
    }

    /// Solve `lhs = row` for `rhs`, moving `lhs` into the cells.
    pub(crate) fn solve_for_symbols(&mut self, lhs: Symbol, rhs: Symbol, epsilon: f64) {
        self.insert_symbol(lhs, -1.0, epsilon);
        self.solve_for(rhs);
    }

    /// Replace `symbol` by `row`. Returns whether the row referenced it.
    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row, epsilon: f64) -> bool {
        match self.cells.swap_remove(&symbol) {
            Some(coeff) => {
                self.insert_row(row, coeff, epsilon);
                true
            }
            None => false,
        }
    }

    /// Lowest-id slack or error symbol in the row.
    pub(crate) fn any_pivotable_symbol(&self) -> Option<Symbol> {
        self.cells.keys().copied().filter(|s| s.is_pivotable()).min()
    }

    pub(crate) fn all_dummies(&self) -> bool {
        self.cells.keys().all(|s| s.is_dummy())
    }
}
