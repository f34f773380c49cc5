//! Strength tiers and the stratified objective row.
//!
//! Non-required strengths map to tiers of a [`SymbolicWeight`]. Weights are
//! compared lexicographically, so any amount of violation in a stronger tier
//! outweighs every violation in the weaker ones. Required constraints never
//! reach the objective.

use std::cmp::Ordering;

use indexmap::IndexMap;
use strata_core::Strength;

use crate::row::Row;
use crate::symbol::Symbol;

pub(crate) const TIER_COUNT: usize = 4;

/// Objective tiers, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Tier {
    /// Edit constraints: above every caller strength except required.
    Edit = 0,
    Strong = 1,
    Medium = 2,
    Weak = 3,
}

impl Tier {
    /// `None` for required constraints.
    pub(crate) fn from_strength(strength: Strength) -> Option<Tier> {
        match strength {
            Strength::Required => None,
            Strength::Strong => Some(Tier::Strong),
            Strength::Medium => Some(Tier::Medium),
            Strength::Weak => Some(Tier::Weak),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A vector of per-tier coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct SymbolicWeight([f64; TIER_COUNT]);

impl SymbolicWeight {
    /// `weight` in a single tier.
    pub(crate) fn of(tier: Tier, weight: f64) -> Self {
        let mut values = [0.0; TIER_COUNT];
        values[tier.index()] = weight;
        Self(values)
    }

    #[cfg(test)]
    pub(crate) fn component(&self, tier: usize) -> f64 {
        self.0[tier]
    }

    pub(crate) fn scaled(&self, factor: f64) -> Self {
        let mut values = self.0;
        for v in &mut values {
            *v *= factor;
        }
        Self(values)
    }

    /// `self += other * factor`
    pub(crate) fn add_scaled(&mut self, other: &SymbolicWeight, factor: f64) {
        for (v, o) in self.0.iter_mut().zip(other.0.iter()) {
            *v += o * factor;
        }
    }

    pub(crate) fn is_zero(&self, epsilon: f64) -> bool {
        self.0.iter().all(|v| v.abs() < epsilon)
    }

    /// The most significant component that is not near zero.
    pub(crate) fn leading(&self, epsilon: f64) -> Option<(usize, f64)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| v.abs() >= epsilon)
    }

    /// Lexicographic comparison; components within `epsilon` compare equal.
    pub(crate) fn compare(&self, other: &SymbolicWeight, epsilon: f64) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            if (a - b).abs() >= epsilon {
                return a.partial_cmp(b).unwrap_or(Ordering::Equal);
            }
        }
        Ordering::Equal
    }
}

/// The objective row: `objective = constant + Σ(weight * symbol)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Objective {
    constant: SymbolicWeight,
    cells: IndexMap<Symbol, SymbolicWeight>,
}

impl Objective {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Single-tier objective equal to `row`; used for phase-one artificial
    /// optimisation.
    pub(crate) fn from_row(row: &Row) -> Self {
        let unit = SymbolicWeight::of(Tier::Edit, 1.0);
        Self {
            constant: unit.scaled(row.constant),
            cells: row.cells().map(|(s, c)| (s, unit.scaled(c))).collect(),
        }
    }

    pub(crate) fn constant(&self) -> &SymbolicWeight {
        &self.constant
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (Symbol, &SymbolicWeight)> + '_ {
        self.cells.iter().map(|(&s, w)| (s, w))
    }

    pub(crate) fn coefficient(&self, symbol: Symbol) -> SymbolicWeight {
        self.cells.get(&symbol).copied().unwrap_or_default()
    }

    pub(crate) fn insert_symbol(&mut self, symbol: Symbol, weight: SymbolicWeight, epsilon: f64) {
        let entry = self.cells.entry(symbol).or_default();
        entry.add_scaled(&weight, 1.0);
        if entry.is_zero(epsilon) {
            self.cells.swap_remove(&symbol);
        }
    }

    /// Add `weight * row`.
    pub(crate) fn insert_row(&mut self, row: &Row, weight: SymbolicWeight, epsilon: f64) {
        self.constant.add_scaled(&weight, row.constant);
        for (symbol, c) in row.cells() {
            self.insert_symbol(symbol, weight.scaled(c), epsilon);
        }
    }

    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row, epsilon: f64) {
        if let Some(weight) = self.cells.swap_remove(&symbol) {
            self.insert_row(row, weight, epsilon);
        }
    }

    pub(crate) fn remove(&mut self, symbol: Symbol) {
        self.cells.swap_remove(&symbol);
    }

    /// Entering symbol for a primal pivot.
    ///
    /// Candidates are non-dummy symbols whose reduced cost is lexicographically
    /// negative. The candidate whose leading tier is most significant wins,
    /// then the most negative cost in that tier, then the lowest symbol id.
    pub(crate) fn entering_symbol(&self, epsilon: f64) -> Option<Symbol> {
        self.cells
            .iter()
            .filter(|(s, _)| !s.is_dummy())
            .filter_map(|(&s, w)| match w.leading(epsilon) {
                Some((tier, value)) if value < 0.0 => Some((tier, value, s)),
                _ => None,
            })
            .min_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| {
                        if (a.1 - b.1).abs() < epsilon {
                            Ordering::Equal
                        } else {
                            a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
                        }
                    })
                    .then_with(|| a.2.cmp(&b.2))
            })
            .map(|(_, _, s)| s)
    }
}
