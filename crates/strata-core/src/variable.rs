//! Variables and the arena that owns their values.

use std::fmt;
use std::ops::Index;

/// Handle to a variable stored in a [`Variables`] arena.
///
/// The handle is only an id; expressions, constraints and the solver refer to
/// variables through it and never own the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub(crate) usize);

impl Variable {
    /// Create a handle from a raw id.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// The stable id of this variable within its arena.
    pub fn id(self) -> usize {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct VariableData {
    name: String,
    value: f64,
}

/// Caller-owned storage for variable names and values.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    entries: Vec<VariableData>,
}

impl Variables {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new variable with a debug name and an initial value.
    pub fn new_variable(&mut self, name: impl Into<String>, value: f64) -> Variable {
        let var = Variable(self.entries.len());
        self.entries.push(VariableData {
            name: name.into(),
            value,
        });
        var
    }

    /// Get the current value of a variable, if it belongs to this arena.
    pub fn get(&self, var: Variable) -> Option<f64> {
        self.entries.get(var.0).map(|data| data.value)
    }

    /// Overwrite the value of a variable. Returns false for foreign handles.
    pub fn set_value(&mut self, var: Variable, value: f64) -> bool {
        match self.entries.get_mut(var.0) {
            Some(data) => {
                data.value = value;
                true
            }
            None => false,
        }
    }

    /// Get the debug name of a variable.
    pub fn name(&self, var: Variable) -> Option<&str> {
        self.entries.get(var.0).map(|data| data.name.as_str())
    }

    /// Check whether the handle belongs to this arena.
    pub fn contains(&self, var: Variable) -> bool {
        var.0 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all variables with their current values.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(id, data)| (Variable(id), data.value))
    }
}

impl Index<Variable> for Variables {
    type Output = f64;

    fn index(&self, var: Variable) -> &f64 {
        &self.entries[var.0].value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut vars = Variables::new();
        let a = vars.new_variable("a", 1.0);
        let b = vars.new_variable("b", 2.0);
        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 1);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_values_and_names() {
        let mut vars = Variables::new();
        let x = vars.new_variable("x", 10.0);
        assert_eq!(vars[x], 10.0);
        assert_eq!(vars.name(x), Some("x"));

        assert!(vars.set_value(x, 42.0));
        assert_eq!(vars.get(x), Some(42.0));
    }

    #[test]
    fn test_foreign_handle() {
        let mut vars = Variables::new();
        let foreign = Variable::new(7);
        assert!(!vars.contains(foreign));
        assert_eq!(vars.get(foreign), None);
        assert!(!vars.set_value(foreign, 1.0));
    }
}
