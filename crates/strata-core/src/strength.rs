//! Constraint strengths.

use std::fmt;

/// Priority tier of a constraint.
///
/// Variants are ordered from weakest to strongest so that comparisons read
/// naturally: `Strength::Required > Strength::Weak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
    #[default]
    Required,
}

impl Strength {
    /// Check if this is the required strength.
    pub fn is_required(self) -> bool {
        self == Strength::Required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
            Strength::Required => "required",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
