//! Tableau symbols.

/// The role a symbol plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum SymbolKind {
    /// A caller variable; unrestricted in sign.
    External,
    /// Slack for an inequality; restricted to be non-negative.
    Slack,
    /// Error for a non-required constraint; restricted to be non-negative.
    Error,
    /// Marker for a required equality; always zero, never pivots in.
    Dummy,
}

/// A tableau variable. Ordering is by id, which is the deterministic
/// tie-break used throughout the simplex steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Symbol {
    id: usize,
    kind: SymbolKind,
}

impl Symbol {
    pub(crate) fn new(id: usize, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub(crate) fn id(self) -> usize {
        self.id
    }

    pub(crate) fn is_external(self) -> bool {
        self.kind == SymbolKind::External
    }

    pub(crate) fn is_error(self) -> bool {
        self.kind == SymbolKind::Error
    }

    pub(crate) fn is_dummy(self) -> bool {
        self.kind == SymbolKind::Dummy
    }

    /// Slack and error symbols may enter the basis during optimisation.
    pub(crate) fn is_pivotable(self) -> bool {
        matches!(self.kind, SymbolKind::Slack | SymbolKind::Error)
    }

    /// Everything except externals is restricted to be non-negative.
    pub(crate) fn is_restricted(self) -> bool {
        !self.is_external()
    }
}

/// Issues fresh symbol ids.
#[derive(Debug, Clone, Default)]
pub(crate) struct SymbolTable {
    next_id: usize,
}

impl SymbolTable {
    pub(crate) fn next(&mut self, kind: SymbolKind) -> Symbol {
        self.next_id += 1;
        Symbol::new(self.next_id, kind)
    }
}
